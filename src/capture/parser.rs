use log::{log_enabled, trace, Level};

use crate::capture::layers::Layer;
use crate::models::filter::Classification;
use crate::models::packet::LinkType;

/// Iterator over the headers of one frame, outermost first.
///
/// Descent stops at the first terminal, unrecognized or truncated header, so any
/// byte sequence yields a finite (possibly empty) sequence of layers.
pub struct Layers<'a> {
    next: Option<Layer<'a>>,
}

impl<'a> Layers<'a> {
    pub fn new(link_type: LinkType, data: &'a [u8]) -> Self {
        Self {
            next: Layer::link(link_type, data),
        }
    }
}

impl<'a> Iterator for Layers<'a> {
    type Item = Layer<'a>;

    fn next(&mut self) -> Option<Layer<'a>> {
        let layer = self.next.take()?;
        self.next = layer.inner();
        Some(layer)
    }
}

/// Header report and classification of one frame
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Dissection {
    /// One line per decoded header field, outermost layer first
    pub lines: Vec<String>,

    /// Classification of the innermost layer reached
    pub classification: Classification,
}

/// Classify a frame without rendering any text
pub fn classify(link_type: LinkType, data: &[u8]) -> Classification {
    Layers::new(link_type, data)
        .last()
        .map(|layer| layer.classify())
        .unwrap_or_default()
}

/// Walk every header of a frame, collecting report lines and the final classification
pub fn dissect(link_type: LinkType, data: &[u8]) -> Dissection {
    let mut dissection = Dissection::default();

    for layer in Layers::new(link_type, data) {
        if log_enabled!(Level::Trace) {
            trace!("Decoded layer: {:?}", layer);
        }
        layer.describe(&mut dissection.lines);
        dissection.classification = layer.classify();
    }

    dissection
}
