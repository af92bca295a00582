/// Lower-cases `name` and separates every upper-case letter after the first
/// with `_`, so `VsOut` becomes `vs_out`.
pub fn snake_case(name: &str) -> String {
    let mut result = String::with_capacity(name.len() + 4);
    let mut first = true;
    for c in name.chars() {
        if c.is_uppercase() {
            if first {
                first = false;
            } else {
                result.push('_');
            }
        }
        result.extend(c.to_lowercase());
    }
    result
}

/// Upper-cased Rust identifier for a generated file name, `blur.frag` →
/// `BLUR_FRAG`.
pub fn static_ident(file_name: &str) -> String {
    file_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snake_cases_block_names() {
        assert_eq!(snake_case("VsOut"), "vs_out");
        assert_eq!(snake_case("TcsOut"), "tcs_out");
        assert_eq!(snake_case("output"), "output");
        // every capital after the first starts a new word
        assert_eq!(snake_case("GLOut"), "g_l_out");
    }

    #[test]
    fn builds_static_identifiers() {
        assert_eq!(static_ident("blur.frag"), "BLUR_FRAG");
        assert_eq!(static_ident("post-fx.comp"), "POST_FX_COMP");
    }
}
