//! Class vocabularies

/// COCO class names (80 classes), the vocabulary of stock YOLO exports
pub const COCO_CLASSES: &[&str] = &[
    "person", "bicycle", "car", "motorcycle", "airplane", "bus", "train", "truck", "boat",
    "traffic light", "fire hydrant", "stop sign", "parking meter", "bench", "bird", "cat",
    "dog", "horse", "sheep", "cow", "elephant", "bear", "zebra", "giraffe", "backpack",
    "umbrella", "handbag", "tie", "suitcase", "frisbee", "skis", "snowboard", "sports ball",
    "kite", "baseball bat", "baseball glove", "skateboard", "surfboard", "tennis racket",
    "bottle", "wine glass", "cup", "fork", "knife", "spoon", "bowl", "banana", "apple",
    "sandwich", "orange", "broccoli", "carrot", "hot dog", "pizza", "donut", "cake", "chair",
    "couch", "potted plant", "bed", "dining table", "toilet", "tv", "laptop", "mouse",
    "remote", "keyboard", "cell phone", "microwave", "oven", "toaster", "sink", "refrigerator",
    "book", "clock", "vase", "scissors", "teddy bear", "hair drier", "toothbrush",
];

/// Parse the `names` metadata written by ultralytics ONNX exports,
/// e.g. `{0: 'person', 1: 'bicycle'}`, into labels ordered by class id
///
/// Returns `None` when the text is malformed or ids are not contiguous from 0.
pub fn parse_names_metadata(text: &str) -> Option<Vec<String>> {
    let body = text.trim().strip_prefix('{')?.strip_suffix('}')?;
    if body.trim().is_empty() {
        return None;
    }

    let mut entries: Vec<(usize, String)> = Vec::new();
    for entry in body.split(',') {
        let (id, name) = entry.split_once(':')?;
        let id: usize = id.trim().parse().ok()?;
        let name = name
            .trim()
            .trim_matches(|c| c == '\'' || c == '"')
            .to_string();
        if name.is_empty() {
            return None;
        }
        entries.push((id, name));
    }

    entries.sort_by_key(|(id, _)| *id);
    let contiguous = entries.iter().enumerate().all(|(i, (id, _))| i == *id);
    if !contiguous {
        return None;
    }
    Some(entries.into_iter().map(|(_, name)| name).collect())
}
