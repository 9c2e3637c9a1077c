//! Integration tests for the explanation pipeline.
//!
//! These tests run an explainer end to end with synthetic images and layer
//! captures, then render and exchange the resulting explanations.

use burn::prelude::*;
use burn_ndarray::NdArray;

use xai::prelude::*;

type TestBackend = NdArray;

/// Three photos of different sizes, resized to the model input like a
/// preprocessing pipeline would.
fn preprocessed_inputs() -> ImageBatch {
    let sources = [
        Image::filled(320, 240, [180, 140, 90]).unwrap(),
        Image::filled(300, 300, [60, 90, 200]).unwrap(),
        Image::filled(200, 260, [30, 30, 30]).unwrap(),
    ];
    let images = sources
        .iter()
        .map(|img| img.resize(224, 224).unwrap())
        .collect();
    ImageBatch::new(images, None).unwrap()
}

/// Capture for a conv layer whose activation peaks in a different corner per image.
fn synthetic_capture(batch_size: usize) -> LayerCapture<TestBackend> {
    let device = Default::default();
    let (channels, side) = (8, 7);

    let mut act = vec![0.0f32; batch_size * channels * side * side];
    for b in 0..batch_size {
        for c in 0..channels {
            let (y, x) = match b % 3 {
                0 => (0, 0),
                1 => (0, side - 1),
                _ => (side - 1, side - 1),
            };
            act[((b * channels + c) * side + y) * side + x] = 1.0 + c as f32;
        }
    }
    let activations = Tensor::<TestBackend, 1>::from_floats(act.as_slice(), &device)
        .reshape([batch_size, channels, side, side]);
    let gradients = Tensor::<TestBackend, 4>::ones([batch_size, channels, side, side], &device);

    let mut capture = LayerCapture::new();
    capture.store_activation("block_16_project", activations);
    capture.store_gradient("block_16_project", gradients);
    capture
}

fn class_names() -> Vec<String> {
    ["tabby", "bull_mastiff", "reflex_camera"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

#[test]
fn test_grad_cam_pipeline() {
    let inputs = preprocessed_inputs();
    let capture = synthetic_capture(inputs.len());
    let names = class_names();

    let explainer = GradCam::new("block_16_project");
    let explanation = explainer
        .explain(&inputs, &capture, &[0, 1, 2], Some(&names))
        .expect("Grad-CAM failed");

    let batch = explanation.get_explanations().expect("no explanations");
    assert_eq!(batch.len(), 3);
    assert_eq!(batch.names().unwrap(), names.as_slice());
    assert!(batch.images().iter().all(|img| img.dimensions() == (224, 224)));

    // Three square images → two columns, two rows.
    let figure = explanation
        .plot(&StaticBackend::default(), None)
        .unwrap()
        .unwrap();
    assert_eq!(figure.layout().columns(), 2);
    assert_eq!(figure.layout().rows(), 2);
    assert!(figure.to_svg().unwrap().contains("reflex_camera"));
}

#[test]
fn test_hot_region_follows_activation() {
    let inputs = preprocessed_inputs();
    let capture = synthetic_capture(inputs.len());
    let mut config = GradCamConfig::new("block_16_project");
    config.overlay = false;

    let explanation = GradCam::from_config(config)
        .explain(&inputs, &capture, &[0, 0, 0], None)
        .unwrap();
    let maps = explanation.get_explanations().unwrap();

    // First image peaks top-left, second top-right.
    let hot = xai::explain::Colormap::Jet.apply(1.0);
    assert_eq!(maps.images()[0].rgb_at(0, 0), Some(hot));
    assert_eq!(maps.images()[1].rgb_at(6, 0), Some(hot));
    assert_ne!(maps.images()[1].rgb_at(0, 0), Some(hot));
}

#[test]
fn test_backends_agree_on_layout() {
    for (n, w, h) in [(1, 10, 10), (3, 10, 10), (8, 10, 10), (16, 20, 10), (11, 10, 30)] {
        let images = vec![Image::filled(w, h, [5, 5, 5]).unwrap(); n];
        let mut explanation = PlainExplanation::new();
        explanation.add(images, None).unwrap();

        let config = PlotConfig {
            tile_size: 16,
            ..Default::default()
        };
        let still = explanation
            .plot(&StaticBackend::new(config.clone()), None)
            .unwrap()
            .unwrap();
        let live = explanation
            .plot(&InteractiveBackend::new(config), None)
            .unwrap()
            .unwrap();

        assert_eq!(still.layout(), live.layout(), "n={n} {w}x{h}");
        assert_eq!(still.panels(), live.panels(), "n={n} {w}x{h}");
        assert_eq!(live.height(), 400 * live.layout().rows() as u64);
    }
}

#[test]
fn test_per_row_override() {
    let images = vec![Image::filled(10, 10, [0, 0, 0]).unwrap(); 7];
    let mut explanation = PlainExplanation::new();
    explanation.add(images, None).unwrap();

    let live = explanation
        .plot(&InteractiveBackend::default(), Some(7))
        .unwrap()
        .unwrap();
    assert_eq!(live.layout().rows(), 1);
    assert_eq!(live.height(), 400);
}

#[test]
fn test_empty_explanation_plots_nothing() {
    let explanation = PlainExplanation::new();
    assert!(explanation.plot(&StaticBackend::default(), None).unwrap().is_none());
    assert!(explanation.plot(&InteractiveBackend::default(), None).unwrap().is_none());
}

#[test]
fn test_export_import_export_identity() {
    let images = vec![
        Image::filled(8, 8, [255, 0, 0]).unwrap(),
        Image::new(8, 8, 1, (0..64).collect()).unwrap(),
        Image::new(8, 8, 4, vec![9; 256]).unwrap(),
    ];
    let names = vec!["dog".to_string(), "cat".to_string(), "camera".to_string()];
    let mut explanation = PlainExplanation::new();
    explanation.add(images, Some(names)).unwrap();

    let first = explanation.dump().unwrap();
    let second = PlainExplanation::from_json(&first).unwrap().dump().unwrap();
    assert_eq!(first, second);

    let value: serde_json::Value = serde_json::from_str(&first).unwrap();
    assert_eq!(value["kind"], "plain");
    assert_eq!(value["explanations"]["name"][2], "camera");
    assert_eq!(value["explanations"]["image"].as_array().unwrap().len(), 3);
}

#[test]
fn test_directory_to_figures() {
    let dir = tempfile::tempdir().unwrap();
    for (i, name) in ["a_cat", "b_dog", "c_car", "d_cup", "e_pen"].iter().enumerate() {
        Image::filled(30, 15, [i as u8 * 40, 100, 100])
            .unwrap()
            .to_dynamic()
            .unwrap()
            .save(dir.path().join(format!("{name}.png")))
            .unwrap();
    }

    let mut explanation = PlainExplanation::new();
    explanation.add_batch(ImageBatch::from_dir(dir.path()).unwrap());

    // e = 2, n = 10 → ceil(10 / 8) = 2 columns.
    let layout = explanation.layout(None).unwrap().unwrap();
    assert_eq!((layout.rows(), layout.columns()), (3, 2));

    let out = dir.path().join("mosaic.png");
    explanation
        .plot(&StaticBackend::default(), None)
        .unwrap()
        .unwrap()
        .save(&out)
        .unwrap();
    assert!(out.exists());

    let html = dir.path().join("mosaic.html");
    explanation
        .plot(&InteractiveBackend::default(), None)
        .unwrap()
        .unwrap()
        .save_html(&html, "mosaic")
        .unwrap();
    assert!(std::fs::read_to_string(&html).unwrap().contains("e_pen"));
}
