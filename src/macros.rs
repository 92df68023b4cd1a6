// src/macros.rs
#[macro_export]
macro_rules! s {
    // String shorthand!

    // Zero-arg → String::new()
    () => {
        ::std::string::String::new()
    };
    // Any single expression: literals, consts, &str or String
    ($expr:expr) => {
        ::std::string::String::from($expr)
    };
}

#[macro_export]
macro_rules! join {
    // String-type concatenation shorthand!
    ($first:expr $(, $rest:expr)+ $(,)?) => {{
        let mut s = ::std::string::String::from($first);
        $(
            s.push_str($rest);
        )+
        s
    }};
}

/// Render an optional text value, falling back to the block/report placeholder.
#[macro_export]
macro_rules! or_placeholder {
    ($opt:expr) => {
        match $opt {
            Some(v) => ::std::string::String::from(v),
            None => ::std::string::String::from($crate::config::consts::PLACEHOLDER),
        }
    };
}
