//! Edit analysis: distance, classification, and word-level diffs.
//!
//! Pure functions over the AI draft and the human final text. The
//! classification is total; exactly one learning type comes back for any
//! grade/ratio combination.

use similar::{capture_diff_slices, Algorithm, DiffOp};

use crate::models::{ChangeKind, EditMagnitude, GradeSet, LearningType, WordChange};

/// Classic single-character-operation edit distance.
///
/// Two-row dynamic programming over Unicode scalar values.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0usize; b.len() + 1];

    for (i, &ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != cb);
            current[j + 1] = substitution
                .min(previous[j + 1] + 1)
                .min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}

/// Edit distance normalized by draft length, floored at 1 to avoid a
/// division by zero for empty drafts.
pub fn edit_ratio(edit_distance: usize, draft_len: usize) -> f32 {
    edit_distance as f32 / draft_len.max(1) as f32
}

/// Classify why the human changed the draft.
///
/// Branches evaluate in order; exactly one fires.
pub fn classify(grades: &GradeSet, edit_ratio: f32) -> LearningType {
    if grades.tone <= 3.0 && grades.accuracy >= 4.0 && grades.policy >= 4.0 {
        LearningType::ToneImprovement
    } else if grades.accuracy <= 3.0 {
        LearningType::FactualCorrection
    } else if grades.policy <= 3.0 {
        LearningType::PolicyClarification
    } else if edit_ratio < 0.3 && grades.tone >= 4.0 && grades.accuracy >= 4.0 {
        LearningType::TemplateRefinement
    } else {
        LearningType::NewPattern
    }
}

/// Whether this edit warrants a new knowledge base article
pub fn should_create_article(
    grades: &GradeSet,
    edit_ratio: f32,
    learning_type: LearningType,
) -> bool {
    (edit_ratio >= 0.3
        && grades.tone >= 4.0
        && grades.accuracy >= 4.0
        && grades.policy >= 4.0)
        || learning_type == LearningType::NewPattern
}

/// Word-level changes between draft and final text.
///
/// Replacements pair up word for word; leftover words in an uneven
/// replacement fall out as plain additions or deletions. Positions index
/// into the revised word sequence except for deletions, which index into
/// the original.
pub fn word_changes(ai_draft: &str, human_final: &str) -> Vec<WordChange> {
    let old_words: Vec<&str> = ai_draft.split_whitespace().collect();
    let new_words: Vec<&str> = human_final.split_whitespace().collect();
    let ops = capture_diff_slices(Algorithm::Myers, &old_words, &new_words);

    let mut changes = Vec::new();
    for op in ops {
        match op {
            DiffOp::Equal { .. } => {}
            DiffOp::Delete {
                old_index, old_len, ..
            } => {
                for offset in 0..old_len {
                    changes.push(WordChange {
                        kind: ChangeKind::Deletion,
                        original: Some(old_words[old_index + offset].to_string()),
                        revised: None,
                        position: old_index + offset,
                    });
                }
            }
            DiffOp::Insert {
                new_index, new_len, ..
            } => {
                for offset in 0..new_len {
                    changes.push(WordChange {
                        kind: ChangeKind::Addition,
                        original: None,
                        revised: Some(new_words[new_index + offset].to_string()),
                        position: new_index + offset,
                    });
                }
            }
            DiffOp::Replace {
                old_index,
                old_len,
                new_index,
                new_len,
            } => {
                let paired = old_len.min(new_len);
                for offset in 0..paired {
                    changes.push(WordChange {
                        kind: ChangeKind::Modification,
                        original: Some(old_words[old_index + offset].to_string()),
                        revised: Some(new_words[new_index + offset].to_string()),
                        position: new_index + offset,
                    });
                }
                for offset in paired..old_len {
                    changes.push(WordChange {
                        kind: ChangeKind::Deletion,
                        original: Some(old_words[old_index + offset].to_string()),
                        revised: None,
                        position: old_index + offset,
                    });
                }
                for offset in paired..new_len {
                    changes.push(WordChange {
                        kind: ChangeKind::Addition,
                        original: None,
                        revised: Some(new_words[new_index + offset].to_string()),
                        position: new_index + offset,
                    });
                }
            }
        }
    }
    changes
}

/// Full analysis of one draft/final pair
#[derive(Debug, Clone, PartialEq)]
pub struct EditAnalysis {
    pub edit_distance: usize,
    pub edit_ratio: f32,
    pub learning_type: LearningType,
    pub magnitude: EditMagnitude,
    pub should_create_article: bool,
    pub changes: Vec<WordChange>,
}

/// Analyze a draft/final pair against its review grades.
pub fn analyze(ai_draft: &str, human_final: &str, grades: &GradeSet) -> EditAnalysis {
    let edit_distance = levenshtein(ai_draft, human_final);
    let ratio = edit_ratio(edit_distance, ai_draft.chars().count());
    let learning_type = classify(grades, ratio);

    EditAnalysis {
        edit_distance,
        edit_ratio: ratio,
        learning_type,
        magnitude: EditMagnitude::from_ratio(ratio),
        should_create_article: should_create_article(grades, ratio, learning_type),
        changes: word_changes(ai_draft, human_final),
    }
}
