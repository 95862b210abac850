use convert_case::{Boundary, Converter, Pattern};

/// Converts the field part of a dynamic method name into the entity's field
/// naming convention (`UserName` → `userName`, `user_name` → `userName`).
///
/// Words break only on `_` and `-`. Interior capitals are kept, so
/// `UserID` becomes `userID`.
pub fn camelize(name: &str) -> String {
    Converter::new()
        .set_boundaries(&[Boundary::Underscore, Boundary::Hyphen])
        .set_patterns(&[Pattern::RemoveEmpty, Pattern::Custom(lower_first_word)])
        .convert(name)
}

fn lower_first_word(words: &[&str]) -> Vec<String> {
    words
        .iter()
        .enumerate()
        .map(|(i, word)| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) if i == 0 => first.to_lowercase().chain(chars).collect(),
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect()
}
