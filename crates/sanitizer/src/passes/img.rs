use crate::config::{PassArgs, parse_args};
use crate::error::PipelineError;
use crate::fallback::NoscriptFallback;
use crate::pass::{PassContext, Sanitizer, is_exempt};
use crate::policy::for_each_match_reverse;
use dom::{Document, NodeKey, TreeError};
use serde::Deserialize;

const COMPONENT_TAG: &str = "amp-img";

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ImgOptions {
    pub default_width: u32,
    pub default_height: u32,
    pub layout: String,
    /// Keep the original `<img>` inside a noscript fallback.
    pub fallback: bool,
}

impl Default for ImgOptions {
    fn default() -> Self {
        Self {
            default_width: 600,
            default_height: 400,
            layout: "responsive".to_string(),
            fallback: true,
        }
    }
}

/// Converts `<img>` into the sized image component.
#[derive(Debug, Default)]
pub struct ImgSanitizer {
    options: ImgOptions,
    fallback: NoscriptFallback,
}

impl ImgSanitizer {
    pub fn new(options: ImgOptions) -> Self {
        Self {
            options,
            fallback: NoscriptFallback::new(),
        }
    }

    pub fn from_args(args: &PassArgs) -> Result<Self, PipelineError> {
        Ok(Self::new(parse_args("img", args)?))
    }

    fn convert(&self, doc: &mut Document, img: NodeKey) -> Result<(), TreeError> {
        let copied: Vec<(String, String)> = doc
            .attributes(img)
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect();
        let amp = doc.create_element(COMPONENT_TAG);
        for (name, value) in &copied {
            doc.set_attr(amp, name, value)?;
        }
        if !doc.has_attr(amp, "width") {
            doc.set_attr(amp, "width", &self.options.default_width.to_string())?;
        }
        if !doc.has_attr(amp, "height") {
            doc.set_attr(amp, "height", &self.options.default_height.to_string())?;
        }
        if !doc.has_attr(amp, "layout") {
            doc.set_attr(amp, "layout", &self.options.layout)?;
        }

        doc.replace_with(img, amp)?;
        if self.options.fallback {
            self.fallback.wrap_as_fallback(doc, amp, img)?;
        } else {
            doc.remove(img)?;
        }
        Ok(())
    }
}

impl Sanitizer for ImgSanitizer {
    fn name(&self) -> &'static str {
        "img"
    }

    fn required_tag_specs(&self) -> Vec<&'static str> {
        if self.options.fallback {
            vec![COMPONENT_TAG, "img"]
        } else {
            vec![COMPONENT_TAG]
        }
    }

    fn sanitize(&mut self, cx: &mut PassContext<'_>) -> Result<(), TreeError> {
        self.fallback.initialize_allowed_attributes(cx.registry, "img");
        let images = cx.doc.elements_by_tag("img");
        let this = &*self;
        for_each_match_reverse(cx.doc, &images, |doc, img| {
            if is_exempt(doc, img) || NoscriptFallback::is_inside_fallback(doc, img) {
                return Ok(());
            }
            let has_source = doc
                .attr(img, "src")
                .or_else(|| doc.attr(img, "srcset"))
                .is_some_and(|src| !src.trim().is_empty());
            if !has_source {
                log::debug!(
                    target: "sanitizer.img",
                    "image without source at {}",
                    doc.location(img)
                );
                return doc.remove(img);
            }
            this.convert(doc, img)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ContextManager;
    use crate::marker::MarkerList;
    use rule_spec::TagSpecRegistry;

    fn registry() -> TagSpecRegistry {
        TagSpecRegistry::from_toml_str(
            r#"
[[tags]]
name = "amp-img"
[[tags.attrs]]
name = "src"

[[tags]]
name = "img"
mandatory_ancestor = ["noscript"]
[[tags.attrs]]
name = "src"
[[tags.attrs]]
name = "alt"
"#,
        )
        .expect("catalog")
    }

    fn run(pass: &mut ImgSanitizer, doc: &mut Document, registry: &TagSpecRegistry) {
        let mut contexts = ContextManager::new();
        let mut markers = MarkerList::new();
        let mut cx = PassContext {
            doc,
            registry,
            contexts: &mut contexts,
            markers: &mut markers,
            host: &(),
        };
        pass.sanitize(&mut cx).unwrap();
    }

    #[test]
    fn img_becomes_amp_img_with_filtered_fallback() {
        let registry = registry();
        let mut doc = Document::new();
        let root = doc.root();
        let img = doc.create_element_with_attributes(
            "img",
            [("src", "cat.png"), ("alt", "cat"), ("onclick", "x()")],
        );
        let bare = doc.create_element("img");
        doc.append_child(root, img).unwrap();
        doc.append_child(root, bare).unwrap();

        let mut pass = ImgSanitizer::default();
        run(&mut pass, &mut doc, &registry);

        let amps = doc.elements_by_tag("amp-img");
        assert_eq!(amps.len(), 1, "image without src is dropped");
        let amp = amps[0];
        assert_eq!(doc.attr(amp, "src"), Some("cat.png"));
        assert_eq!(doc.attr(amp, "width"), Some("600"));
        assert_eq!(doc.attr(amp, "height"), Some("400"));
        assert_eq!(doc.attr(amp, "layout"), Some("responsive"));
        assert!(!doc.contains(bare));

        assert!(NoscriptFallback::is_inside_fallback(&doc, img));
        assert_eq!(doc.attr(img, "alt"), Some("cat"));
        assert!(!doc.has_attr(img, "onclick"));

        let once = doc.snapshot();
        run(&mut pass, &mut doc, &registry);
        assert_eq!(doc.snapshot(), once, "second run must not change the tree");
    }

    #[test]
    fn fallback_requirement_follows_options() {
        let pass = ImgSanitizer::new(ImgOptions {
            fallback: false,
            ..ImgOptions::default()
        });
        assert_eq!(pass.required_tag_specs(), ["amp-img"]);
        assert_eq!(ImgSanitizer::default().required_tag_specs(), ["amp-img", "img"]);
    }
}
