use ammonia;

/// Clean user-authored text using the ammonia library, then trim it.
///
/// Quiz names, descriptions, question and option text end up in browsers, so
/// dangerous tags (like <script>, <iframe>) and their content are stripped
/// while harmless inline markup is kept. Characters such as `<` and `&` come
/// back entity-escaped.
pub fn clean_text(input: &str) -> String {
    ammonia::clean(input).trim().to_string()
}
