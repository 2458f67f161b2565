//! Naming conventions shared by the configuration layer
//!
//! Config keys are matched to setters and section names to section loaders
//! through these transformations, so they must stay stable.

/// Convert a label to snake case.
///
/// An underscore is inserted before every uppercase character that is not
/// the first one, then the whole string is lowercased. Runs of capitals are
/// split letter by letter (`HTTPServer` becomes `h_t_t_p_server`).
pub fn snake_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 4);
    for (i, c) in text.chars().enumerate() {
        if i > 0 && c.is_uppercase() {
            out.push('_');
        }
        out.extend(c.to_lowercase());
    }
    out
}

/// Convert a snake case label to camel case (`animation_states` becomes
/// `AnimationStates`). Empty segments keep their underscore.
pub fn camel_case(text: &str) -> String {
    text.split('_')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => {
                    let mut word: String = first.to_uppercase().collect();
                    word.push_str(&chars.as_str().to_lowercase());
                    word
                }
                None => "_".to_string(),
            }
        })
        .collect()
}

/// Name of the setter a config key dispatches to
pub fn setter_name(key: &str) -> String {
    format!("set_{}", snake_case(key))
}

/// Name of the loader a config section dispatches to
pub fn loader_name(section: &str) -> String {
    format!("load_{}_data", snake_case(section))
}
