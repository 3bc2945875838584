// service/category_resolver.rs
use serde_json::Value;

use crate::{
    models::turnmodel::{CategoryInfo, TaggedDuration},
    utils::rowfields,
};

const NAME_KEYS: [&str; 2] = ["nombre", "name"];

// Every generation that carries a category stores its average in seconds.
const AVERAGE_KEYS: [&str; 3] = ["tiempo_promedio", "average_service_duration", "averageServiceDuration"];

/// The join payload after its shape has been settled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CategoryJoin<'a> {
    Present(&'a Value),
    Empty,
}

impl<'a> CategoryJoin<'a> {
    /// Object, first element of a sequence, or nothing.
    pub fn from_payload(payload: &'a Value) -> Self {
        match payload {
            Value::Object(_) => CategoryJoin::Present(payload),
            Value::Array(items) => match items.first() {
                Some(first @ Value::Object(_)) => CategoryJoin::Present(first),
                _ => CategoryJoin::Empty,
            },
            _ => CategoryJoin::Empty,
        }
    }
}

/// Resolve the category join into a `CategoryInfo`. Never fails: an absent join
/// yields the "General Attention" defaults.
pub fn resolve_category(payload: &Value) -> CategoryInfo {
    match CategoryJoin::from_payload(payload) {
        CategoryJoin::Present(object) => {
            let name = NAME_KEYS
                .iter()
                .find_map(|key| rowfields::text(object, key))
                .unwrap_or_else(|| CategoryInfo::DEFAULT_NAME.to_string());

            let average_service_duration = AVERAGE_KEYS
                .iter()
                .find_map(|key| rowfields::number(object, key))
                .map(TaggedDuration::seconds);

            CategoryInfo {
                name,
                average_service_duration,
            }
        }
        CategoryJoin::Empty => CategoryInfo::default(),
    }
}
