use std::cell::Cell;
use std::rc::Rc;

use ndarray::{Array3, Array4, ArrayD, IxDyn};
use objdetect::{
    BoundingBox, Canvas, DetectError, DetectionResult, DetectorConfig, Detections, Frame,
    Interpreter, ObjectDetector, PixelRect, Result,
};

/// 按预设输出返回结果的解释器
struct ScriptedInterpreter {
    boxes: Vec<[f32; 4]>,
    classes: Vec<f32>,
    scores: Vec<f32>,
    fail: bool,
    invocations: Rc<Cell<usize>>,
    ready: bool,
}

impl ScriptedInterpreter {
    fn new(entries: &[([f32; 4], f32, f32)]) -> Self {
        Self {
            boxes: entries.iter().map(|e| e.0).collect(),
            classes: entries.iter().map(|e| e.1).collect(),
            scores: entries.iter().map(|e| e.2).collect(),
            fail: false,
            invocations: Rc::new(Cell::new(0)),
            ready: false,
        }
    }

    fn failing() -> Self {
        Self { fail: true, ..Self::new(&[]) }
    }
}

impl Interpreter for ScriptedInterpreter {
    fn set_input(&mut self, input: Array4<f32>) -> Result<()> {
        assert_eq!(input.shape()[0], 1);
        assert_eq!(input.shape()[3], 3);
        self.ready = true;
        Ok(())
    }

    fn invoke(&mut self) -> Result<()> {
        if self.fail {
            return Err(DetectError::Inference("backend exploded".to_string()));
        }
        assert!(self.ready, "invoke before set_input");
        self.invocations.set(self.invocations.get() + 1);
        Ok(())
    }

    fn output(&self, index: usize) -> Result<ArrayD<f32>> {
        let n = self.scores.len();
        let array = match index {
            0 => ArrayD::from_shape_vec(IxDyn(&[1, n, 4]), self.boxes.concat()),
            1 => ArrayD::from_shape_vec(IxDyn(&[1, n]), self.classes.clone()),
            2 => ArrayD::from_shape_vec(IxDyn(&[1, n]), self.scores.clone()),
            _ => return Err(DetectError::Inference(format!("no output {index}"))),
        };
        array.map_err(|e| DetectError::Inference(e.to_string()))
    }
}

#[derive(Default)]
struct RecordingCanvas {
    rects: Vec<(PixelRect, [u8; 3])>,
    texts: Vec<String>,
}

impl Canvas for RecordingCanvas {
    fn width(&self) -> u32 {
        200
    }

    fn height(&self) -> u32 {
        100
    }

    fn draw_rect(&mut self, rect: PixelRect, bgr: [u8; 3], _thickness: u32) {
        self.rects.push((rect, bgr));
    }

    fn fill_rect(&mut self, _rect: PixelRect, _bgr: [u8; 3]) {}

    fn text_size(&self, text: &str, _scale: f32) -> (u32, u32) {
        (text.len() as u32 * 10, 20)
    }

    fn draw_text(&mut self, text: &str, _origin: (i32, i32), _scale: f32, _bgr: [u8; 3]) {
        self.texts.push(text.to_string());
    }
}

const BOX: [f32; 4] = [0.1, 0.1, 0.6, 0.6];

fn frame() -> Frame {
    Frame::from_array(Array3::from_elem((48, 64, 3), 90)).unwrap()
}

fn config() -> DetectorConfig {
    DetectorConfig::new("unused.onnx").with_input_size(32)
}

#[test]
fn raw_class_zero_is_reported_as_person() {
    let interp = ScriptedInterpreter::new(&[(BOX, 0.0, 0.91)]);
    let mut detector = ObjectDetector::with_interpreter(interp, &config()).unwrap();
    let result = detector.detect(&frame()).unwrap();
    assert_eq!(result, DetectionResult::from([("person".to_string(), 0.91)]));
}

#[test]
fn allow_list_keeps_only_listed_labels() {
    // 原始类别 2 => car, 17 => dog
    let interp = ScriptedInterpreter::new(&[(BOX, 2.0, 0.7), (BOX, 17.0, 0.9)]);
    let cfg = config().with_valid_labels(["car"]).with_min_score(0.6);
    let mut detector = ObjectDetector::with_interpreter(interp, &cfg).unwrap();
    let result = detector.detect(&frame()).unwrap();
    assert_eq!(result, DetectionResult::from([("car".to_string(), 0.7)]));
}

#[test]
fn without_allow_list_any_label_above_min_score_appears() {
    let interp = ScriptedInterpreter::new(&[(BOX, 2.0, 0.7), (BOX, 17.0, 0.9), (BOX, 0.0, 0.55)]);
    let mut detector = ObjectDetector::with_interpreter(interp, &config()).unwrap();
    let result = detector.detect(&frame()).unwrap();
    assert_eq!(result.len(), 2);
    assert_eq!(result.get("dog"), Some(&0.9));
    assert!(!result.contains_key("person"));
}

#[test]
fn earliest_duplicate_label_wins() {
    let interp = ScriptedInterpreter::new(&[(BOX, 2.0, 0.55), (BOX, 2.0, 0.8)]);
    let cfg = config().with_min_score(0.5);
    let mut detector = ObjectDetector::with_interpreter(interp, &cfg).unwrap();
    let result = detector.detect(&frame()).unwrap();
    assert_eq!(result.get("car"), Some(&0.55));
}

#[test]
fn max_boxes_cap_applies_before_aggregation() {
    let entries: Vec<_> = (0..15).map(|i| (BOX, i as f32, 0.9)).collect();
    let interp = ScriptedInterpreter::new(&entries);
    let mut detector = ObjectDetector::with_interpreter(interp, &config()).unwrap();
    let kept = detector.run_detection(&frame()).unwrap();
    assert_eq!(kept.len(), 10);

    let interp = ScriptedInterpreter::new(&entries);
    let cfg = config().with_max_boxes(0);
    let mut detector = ObjectDetector::with_interpreter(interp, &cfg).unwrap();
    assert_eq!(detector.run_detection(&frame()).unwrap().len(), 15);
}

#[test]
fn repeated_detection_is_idempotent() {
    let interp = ScriptedInterpreter::new(&[(BOX, 0.0, 0.91), (BOX, 2.0, 0.75)]);
    let invocations = Rc::clone(&interp.invocations);
    let mut detector = ObjectDetector::with_interpreter(interp, &config()).unwrap();
    let mut f = frame();
    let first = detector.detect_frame(&mut f, false).unwrap();
    let second = detector.detect_frame(&mut f, false).unwrap();
    assert_eq!(first, second);
    assert_eq!(f, frame());
    assert_eq!(invocations.get(), 2);
}

#[test]
fn empty_frame_is_rejected_before_inference() {
    let interp = ScriptedInterpreter::new(&[(BOX, 0.0, 0.91)]);
    let invocations = Rc::clone(&interp.invocations);
    let mut detector = ObjectDetector::with_interpreter(interp, &config()).unwrap();
    let mut empty = Frame::from_array(Array3::zeros((0, 0, 3))).unwrap();
    let err = detector.detect_frame(&mut empty, true).unwrap_err();
    assert!(matches!(err, DetectError::InvalidInput(_)));
    assert_eq!(invocations.get(), 0);
}

#[test]
fn failed_inference_leaves_frame_untouched() {
    let mut detector =
        ObjectDetector::with_interpreter(ScriptedInterpreter::failing(), &config()).unwrap();
    let mut f = frame();
    let err = detector.detect_frame(&mut f, true).unwrap_err();
    assert!(matches!(err, DetectError::Inference(_)));
    assert_eq!(f, frame());
}

#[test]
fn drawing_mutates_frame_in_place() {
    let interp = ScriptedInterpreter::new(&[([0.2, 0.2, 0.8, 0.8], 0.0, 0.91)]);
    let mut detector = ObjectDetector::with_interpreter(interp, &config()).unwrap();
    let mut f = frame();
    let result = detector.detect_frame(&mut f, true).unwrap();
    assert_eq!(result.len(), 1);
    assert_ne!(f, frame());
    let expected = detector.colors()[1].bgr();
    // 左边框 x = round(0.2 * 64) = 13
    assert_eq!(f.pixel(13, 30), Some(expected));
}

#[test]
fn annotator_draws_in_reverse_and_respects_allow_list() {
    let interp = ScriptedInterpreter::new(&[]);
    let cfg = config().with_valid_labels(["car", "person"]);
    let detector = ObjectDetector::with_interpreter(interp, &cfg).unwrap();

    let mut dets = Detections::new();
    dets.push(BoundingBox::new(0.1, 0.1, 0.5, 0.5), 1, 0.9);
    dets.push(BoundingBox::new(0.2, 0.2, 0.6, 0.6), 18, 0.8);
    dets.push(BoundingBox::new(-0.5, 0.5, 0.9, 1.5), 3, 0.55);

    let mut canvas = RecordingCanvas::default();
    detector.draw_boxes(&mut canvas, &dets);

    assert_eq!(canvas.texts, vec!["car 0.55", "person 0.90"]);
    // 越界坐标被限制在画布范围内
    assert_eq!(canvas.rects[0].0, PixelRect::new(100, 0, 200, 90));
    assert_eq!(canvas.rects[0].1, detector.colors()[3].bgr());
}

#[test]
fn invalid_config_fails_at_construction() {
    let cfg = config().with_min_score(-0.1);
    let err = ObjectDetector::with_interpreter(ScriptedInterpreter::new(&[]), &cfg).err();
    assert!(matches!(err, Some(DetectError::Configuration(_))));
}

#[test]
fn missing_model_file_is_configuration_error() {
    let err = ObjectDetector::new("/nonexistent/ssd.onnx", None, None).err();
    assert!(matches!(err, Some(DetectError::Configuration(_))));
}
