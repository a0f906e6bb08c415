use crate::config::{PassArgs, parse_args};
use crate::error::PipelineError;
use crate::pass::{PassContext, Sanitizer, ScriptDescriptor, component_script, is_exempt};
use crate::policy::{apply_removal_policy, for_each_match_reverse};
use dom::TreeError;
use serde::Deserialize;

const COMPONENT_TAG: &str = "amp-carousel";

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct CarouselOptions {
    /// Rename `div` containers carrying `gallery_class` into carousels.
    pub convert_galleries: bool,
    pub gallery_class: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub layout: String,
    pub width: u32,
    pub height: u32,
}

impl Default for CarouselOptions {
    fn default() -> Self {
        Self {
            convert_galleries: true,
            gallery_class: "gallery".to_string(),
            kind: "slides".to_string(),
            layout: "responsive".to_string(),
            width: 400,
            height: 300,
        }
    }
}

/// Normalizes carousels: converts galleries, drops empty carousels and fills
/// in the attributes the runtime needs.
#[derive(Debug, Default)]
pub struct CarouselSanitizer {
    options: CarouselOptions,
    used: bool,
}

impl CarouselSanitizer {
    pub fn new(options: CarouselOptions) -> Self {
        Self {
            options,
            used: false,
        }
    }

    pub fn from_args(args: &PassArgs) -> Result<Self, PipelineError> {
        Ok(Self::new(parse_args("carousel", args)?))
    }
}

impl Sanitizer for CarouselSanitizer {
    fn name(&self) -> &'static str {
        "carousel"
    }

    fn required_tag_specs(&self) -> Vec<&'static str> {
        vec![COMPONENT_TAG]
    }

    fn sanitize(&mut self, cx: &mut PassContext<'_>) -> Result<(), TreeError> {
        self.used = false;
        let options = &self.options;

        if options.convert_galleries {
            for div in cx.doc.elements_by_tag("div") {
                if cx.doc.attr_has_token(div, "class", &options.gallery_class)
                    && !is_exempt(cx.doc, div)
                {
                    cx.doc.set_tag_name(div, COMPONENT_TAG)?;
                }
            }
        }

        let carousels = cx.doc.elements_by_tag(COMPONENT_TAG);
        let mut used = false;
        for_each_match_reverse(cx.doc, &carousels, |doc, carousel| {
            if is_exempt(doc, carousel) {
                return Ok(());
            }
            if doc.element_children(carousel).is_empty() {
                log::debug!(
                    target: "sanitizer.carousel",
                    "empty carousel at {}",
                    doc.location(carousel)
                );
                return apply_removal_policy(doc, carousel).map(|_| ());
            }
            let defaults = [
                ("type", options.kind.clone()),
                ("layout", options.layout.clone()),
                ("width", options.width.to_string()),
                ("height", options.height.to_string()),
            ];
            for (name, value) in defaults {
                if !doc.has_attr(carousel, name) {
                    doc.set_attr(carousel, name, &value)?;
                }
            }
            used = true;
            Ok(())
        })?;
        self.used = used;
        Ok(())
    }

    fn scripts(&self) -> Vec<ScriptDescriptor> {
        if self.used {
            vec![component_script(COMPONENT_TAG)]
        } else {
            Vec::new()
        }
    }
}
