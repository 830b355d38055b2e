//! Ordered, anchor-guarded text edits over a document.
//!
//! A step whose anchor is missing is skipped; a step that applies replaces its
//! whole target in one go, so the document is never half-written.

use std::fmt;

type Rewrite = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

pub enum Edit {
    /// Replace the first occurrence of `needle`.
    ReplaceFirst { needle: String, replacement: String },
    /// Insert `text` right before the last occurrence of `anchor`.
    InsertBeforeLast { anchor: String, text: String },
    /// Rewrite the text between the first `start` and the next `end`; both markers stay.
    /// The step is skipped when `rewrite` returns `None`.
    Region { start: String, end: String, rewrite: Rewrite },
}

impl fmt::Debug for Edit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Edit::ReplaceFirst { needle, .. } => f.debug_struct("ReplaceFirst").field("needle", needle).finish(),
            Edit::InsertBeforeLast { anchor, .. } => {
                f.debug_struct("InsertBeforeLast").field("anchor", anchor).finish()
            }
            Edit::Region { start, end, .. } => f
                .debug_struct("Region")
                .field("start", start)
                .field("end", end)
                .finish(),
        }
    }
}

impl Edit {
    pub fn replace_first(needle: impl Into<String>, replacement: impl Into<String>) -> Self {
        Edit::ReplaceFirst {
            needle: needle.into(),
            replacement: replacement.into(),
        }
    }

    pub fn insert_before_last(anchor: impl Into<String>, text: impl Into<String>) -> Self {
        Edit::InsertBeforeLast {
            anchor: anchor.into(),
            text: text.into(),
        }
    }

    pub fn region(
        start: impl Into<String>,
        end: impl Into<String>,
        rewrite: impl Fn(&str) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        Edit::Region {
            start: start.into(),
            end: end.into(),
            rewrite: Box::new(rewrite),
        }
    }

    /// Apply to `doc`; `None` when the anchor is absent.
    pub fn apply(&self, doc: &str) -> Option<String> {
        match self {
            Edit::ReplaceFirst { needle, replacement } => {
                let at = doc.find(needle.as_str())?;
                Some(splice(doc, at, at + needle.len(), replacement))
            }
            Edit::InsertBeforeLast { anchor, text } => {
                let at = doc.rfind(anchor.as_str())?;
                Some(splice(doc, at, at, text))
            }
            Edit::Region { start, end, rewrite } => {
                let inner_start = doc.find(start.as_str())? + start.len();
                let inner_end = inner_start + doc[inner_start..].find(end.as_str())?;
                let replacement = rewrite(&doc[inner_start..inner_end])?;
                Some(splice(doc, inner_start, inner_end, &replacement))
            }
        }
    }
}

fn splice(doc: &str, from: usize, to: usize, replacement: &str) -> String {
    let mut out = String::with_capacity(doc.len() - (to - from) + replacement.len());
    out.push_str(&doc[..from]);
    out.push_str(replacement);
    out.push_str(&doc[to..]);
    out
}

#[derive(Debug)]
pub struct PatchStep {
    pub name: &'static str,
    pub edit: Edit,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchReport {
    pub applied: Vec<&'static str>,
    pub skipped: Vec<&'static str>,
}

/// Steps applied strictly in insertion order.
#[derive(Debug, Default)]
pub struct DocumentPatch {
    steps: Vec<PatchStep>,
}

impl DocumentPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(mut self, name: &'static str, edit: Edit) -> Self {
        self.steps.push(PatchStep { name, edit });
        self
    }

    pub fn push(&mut self, name: &'static str, edit: Edit) {
        self.steps.push(PatchStep { name, edit });
    }

    pub fn apply(&self, doc: &str) -> (String, PatchReport) {
        let mut current = doc.to_string();
        let mut report = PatchReport::default();
        for step in &self.steps {
            match step.edit.apply(&current) {
                Some(next) => {
                    current = next;
                    report.applied.push(step.name);
                }
                None => {
                    log::debug!("template step {:?} skipped: anchor not found", step.name);
                    report.skipped.push(step.name);
                }
            }
        }
        (current, report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_first_only_touches_first_occurrence() {
        let e = Edit::replace_first("a", "b");
        assert_eq!(e.apply("a-a").as_deref(), Some("b-a"));
        assert_eq!(e.apply("xyz"), None);
    }

    #[test]
    fn insert_before_last_anchor() {
        let e = Edit::insert_before_last("</C>", "x");
        assert_eq!(e.apply("<C></C><C></C>").as_deref(), Some("<C></C><C>x</C>"));
    }

    #[test]
    fn region_keeps_markers() {
        let e = Edit::region("[", "]", |inner| Some(inner.to_uppercase()));
        assert_eq!(e.apply("a[bc]d]").as_deref(), Some("a[BC]d]"));
        assert_eq!(e.apply("a[bc").as_deref(), None);
        assert_eq!(e.apply("a]bc[").as_deref(), None);
    }

    #[test]
    fn region_rewrite_can_decline() {
        let e = Edit::region("<", ">", |_| None);
        assert_eq!(e.apply("<x>"), None);
    }

    #[test]
    fn patch_reports_skipped_steps_in_order() {
        let patch = DocumentPatch::new()
            .step("one", Edit::replace_first("1", "one"))
            .step("missing", Edit::replace_first("9", "nine"))
            .step("two", Edit::replace_first("2", "two"));
        let (doc, report) = patch.apply("1 2");
        assert_eq!(doc, "one two");
        assert_eq!(report.applied, ["one", "two"]);
        assert_eq!(report.skipped, ["missing"]);
    }
}
