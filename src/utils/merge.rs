use crate::domain::StringMap;

/// Applies each layer in order; a later layer overwrites an earlier one's key.
fn merge_layers<'a, I>(tag_layers: I, request_layer: &StringMap) -> StringMap
where
    I: IntoIterator<Item = &'a StringMap>,
{
    let mut merged = StringMap::new();
    for layer in tag_layers {
        for (key, value) in layer {
            merged.insert(key.clone(), value.clone());
        }
    }
    for (key, value) in request_layer {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

/// Precedence: request > last tag > ... > first tag.
pub fn merge_headers<'a, I>(tag_headers: I, request_headers: &StringMap) -> StringMap
where
    I: IntoIterator<Item = &'a StringMap>,
{
    merge_layers(tag_headers, request_headers)
}

pub fn merge_params<'a, I>(tag_params: I, request_params: &StringMap) -> StringMap
where
    I: IntoIterator<Item = &'a StringMap>,
{
    merge_layers(tag_params, request_params)
}
