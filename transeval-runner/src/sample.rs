use transeval_core::model::{ConstraintPartial, DatasetRecord, Scene, Segment, SegmentKind, Sample};

/// Renders one preceding segment as `"[kind] speaker: text"` (§4.11). The
/// `[kind]` prefix is omitted for dialogue; the `speaker:` prefix is omitted
/// when the segment has no speaker.
fn render_segment(segment: &Segment) -> String {
    let kind_prefix = match segment.kind {
        SegmentKind::Dialogue => String::new(),
        SegmentKind::Narration => "[narration] ".to_string(),
        SegmentKind::Sfx => "[sfx] ".to_string(),
    };
    let speaker_prefix = match &segment.speaker {
        Some(speaker) => format!("{speaker}: "),
        None => String::new(),
    };
    format!("{kind_prefix}{speaker_prefix}{}", segment.text)
}

/// Expands one [`Scene`] into samples, one per segment, sorted by `t` (§4.11).
/// Context is the last two preceding segments; constraints are the scene's
/// constraints with `targetLang` pinned to `scene.langTgt`.
pub fn expand_scene(scene: &Scene) -> Vec<Sample> {
    let mut segments = scene.segments.clone();
    segments.sort_by_key(|s| s.t);

    let mut constraints = scene.constraints.clone();
    constraints.target_lang = Some(scene.lang_tgt.clone());

    segments
        .iter()
        .enumerate()
        .map(|(i, segment)| {
            let start = i.saturating_sub(2);
            let context = segments[start..i].iter().map(render_segment).collect::<Vec<_>>().join("\n");
            Sample {
                sample_id: format!("{}:{}", scene.scene_id, segment.t),
                source_text: segment.text.clone(),
                context,
                constraints: constraints.clone(),
                reference_en: None,
            }
        })
        .collect()
}

/// Maps one dataset JSONL row (§6.1) directly into a [`Sample`], for the
/// `run`/`run-one` CLI entry points that bypass the scene-based experiment
/// driver entirely.
pub fn from_dataset_record(record: &DatasetRecord) -> Sample {
    Sample {
        sample_id: record.id.clone(),
        source_text: record.ja.text.clone(),
        context: record.ja.context.clone().unwrap_or_default(),
        constraints: record.constraints.clone().unwrap_or_else(ConstraintPartial::default),
        reference_en: record.reference.as_ref().map(|r| r.en.clone()),
    }
}
