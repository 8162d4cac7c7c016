use super::MutationOperation;
use crate::confirm::Summary;
use crate::context::ExecutionContext;
use crate::error::RepositoryError;
use crate::executor::Detail;
use crate::model::{ContentId, FieldValue};
use crate::preview::render_word_diff;
use crate::richtext::{strip_link_tags, Element, RichText};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const LINK_ELEMENT: &str = "link";

fn is_link(el: &Element) -> bool {
    el.name.eq_ignore_ascii_case(LINK_ELEMENT)
}

/// A `<link url_id="N">` element. Links addressing nodes or objects are kept.
fn is_url_link(el: &Element) -> bool {
    is_link(el)
        && el
            .attribute("url_id")
            .is_some_and(|id| !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()))
}

/// How link markup is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StripMode {
    /// Remove url links from the parsed tree, keeping their children.
    #[default]
    Tree,
    /// Regex over the serialized text, then re-parse.
    Flat,
}

impl FromStr for StripMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tree" => Ok(Self::Tree),
            "flat" => Ok(Self::Flat),
            other => Err(format!("unknown strip mode '{other}', expected 'tree' or 'flat'")),
        }
    }
}

impl fmt::Display for StripMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tree => f.write_str("tree"),
            Self::Flat => f.write_str("flat"),
        }
    }
}

/// Remove link elements from a rich-text field and republish.
pub struct StripLinks {
    field: String,
    mode: StripMode,
    dry_run: bool,
    use_color: bool,
}

impl StripLinks {
    pub fn new(field: &str) -> Self {
        Self {
            field: field.to_string(),
            mode: StripMode::default(),
            dry_run: false,
            use_color: false,
        }
    }

    pub fn mode(mut self, mode: StripMode) -> Self {
        self.mode = mode;
        self
    }

    /// Compute and preview the change without creating drafts.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn use_color(mut self, use_color: bool) -> Self {
        self.use_color = use_color;
        self
    }

    fn clean(&self, doc: &RichText) -> Result<(RichText, usize), RepositoryError> {
        match self.mode {
            StripMode::Tree => Ok(doc.unwrap_elements(is_url_link)),
            StripMode::Flat => {
                let (text, removed) = strip_link_tags(&doc.to_xml());
                let cleaned = RichText::parse(&text).map_err(|e| {
                    RepositoryError::FieldValidation(format!(
                        "field '{}' is not valid after stripping links: {}",
                        self.field, e
                    ))
                })?;
                Ok((cleaned, removed))
            },
        }
    }
}

impl MutationOperation for StripLinks {
    type Record = ContentId;

    fn name(&self) -> &'static str {
        "strip-links"
    }

    fn apply(&self, id: &ContentId, ctx: &ExecutionContext<'_>) -> Result<Detail, RepositoryError> {
        let service = ctx.repository().content();
        let content = service.load_content(*id)?;

        let Some(value) = content.field(&self.field) else {
            return Ok(Detail::no_op(format!("no '{}' field", self.field)));
        };
        let Some(doc) = value.as_rich_text() else {
            return Ok(Detail::no_op(format!("'{}' is not a rich text field", self.field)));
        };
        if doc.count_elements(is_link) == 0 {
            return Ok(Detail::no_op("no links found"));
        }

        let (cleaned, removed) = self.clean(doc)?;
        if removed == 0 {
            return Ok(Detail::no_op("no link tags matched"));
        }

        if self.dry_run {
            let preview = render_word_diff(&doc.to_xml(), &cleaned.to_xml(), self.use_color);
            return Ok(
                Detail::no_op(format!("{removed} link(s) would be stripped")).with_preview(preview)
            );
        }

        let who = ctx.identity();
        let draft = service.create_content_draft(who, &content.info)?;
        let mut update = service.new_content_update();
        update.set_field(&self.field, FieldValue::RichText(cleaned));
        let draft = service.update_content(who, &draft, &update)?;
        let published = service.publish_version(who, &draft)?;

        Ok(Detail::changed(format!(
            "stripped {} link(s), published version {}",
            removed,
            published.current_version.unwrap_or(draft.number)
        )))
    }

    fn requires_confirmation(&self) -> bool {
        !self.dry_run
    }

    fn summary(&self, records: &[ContentId]) -> Summary {
        Summary::count(
            &format!("Content objects to strip links from in field '{}'", self.field),
            records.len(),
        )
    }
}
