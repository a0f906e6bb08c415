//! The built-in passes and name-based construction for configured pipelines.

mod carousel;
mod form;
mod img;
mod script;
mod style;
mod tag_and_attribute;
mod template;

pub use carousel::{CarouselOptions, CarouselSanitizer};
pub use form::{FormOptions, FormSanitizer};
pub use img::{ImgOptions, ImgSanitizer};
pub use script::{ScriptOptions, ScriptSanitizer};
pub use style::{StyleOptions, StyleSanitizer};
pub use tag_and_attribute::{TagAndAttributeOptions, TagAndAttributeSanitizer};
pub use template::{MUSTACHE_CONTEXT, TemplateOptions, TemplateSanitizer};

use crate::config::PassArgs;
use crate::error::PipelineError;
use crate::pass::Sanitizer;

pub const PASS_NAMES: &[&str] = &[
    "template",
    "script",
    "style",
    "form",
    "img",
    "carousel",
    "tag_and_attribute",
];

/// Constructs a pass by its configured name.
pub fn build_pass(name: &str, args: &PassArgs) -> Result<Box<dyn Sanitizer>, PipelineError> {
    let pass: Box<dyn Sanitizer> = match name {
        "template" => Box::new(TemplateSanitizer::from_args(args)?),
        "script" => Box::new(ScriptSanitizer::from_args(args)?),
        "style" => Box::new(StyleSanitizer::from_args(args)?),
        "form" => Box::new(FormSanitizer::from_args(args)?),
        "img" => Box::new(ImgSanitizer::from_args(args)?),
        "carousel" => Box::new(CarouselSanitizer::from_args(args)?),
        "tag_and_attribute" => Box::new(TagAndAttributeSanitizer::from_args(args)?),
        other => return Err(PipelineError::UnknownPass(other.to_string())),
    };
    Ok(pass)
}

/// Every built-in pass in its usual order, with default options.
pub fn default_passes() -> Vec<Box<dyn Sanitizer>> {
    vec![
        Box::new(TemplateSanitizer::default()),
        Box::new(ScriptSanitizer::default()),
        Box::new(StyleSanitizer::default()),
        Box::new(FormSanitizer::default()),
        Box::new(ImgSanitizer::default()),
        Box::new(CarouselSanitizer::default()),
        Box::new(TagAndAttributeSanitizer::default()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_listed_name_builds_and_reports_itself() {
        for name in PASS_NAMES {
            let pass = build_pass(name, &PassArgs::new()).unwrap();
            assert_eq!(pass.name(), *name);
        }
        let defaults: Vec<&str> = default_passes().iter().map(|p| p.name()).collect();
        assert_eq!(defaults, PASS_NAMES);
    }

    #[test]
    fn unknown_names_are_rejected() {
        assert!(matches!(
            build_pass("iframe", &PassArgs::new()),
            Err(PipelineError::UnknownPass(name)) if name == "iframe"
        ));
    }
}
