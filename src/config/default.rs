use std::collections::HashSet;

use crate::sanitizer::SanitizerConfig;

lazy_static! {
    pub static ref DEFAULT_CONFIG: SanitizerConfig = SanitizerConfig {
        allow_comments: false,
        allowed_elements: hashmap! {
            local_name!("html") => HashSet::new(),
            local_name!("head") => HashSet::new(),
            local_name!("title") => HashSet::new(),
            local_name!("body") => HashSet::new(),
            local_name!("h1") => HashSet::new(),
            local_name!("h2") => HashSet::new(),
            local_name!("h3") => HashSet::new(),
            local_name!("h4") => HashSet::new(),
            local_name!("h5") => HashSet::new(),
            local_name!("h6") => HashSet::new(),
            local_name!("p") => HashSet::new(),
            local_name!("br") => HashSet::new(),
            local_name!("hr") => HashSet::new(),
            local_name!("div") => HashSet::new(),
            local_name!("span") => HashSet::new(),
            local_name!("blockquote") => hashset! {
                local_name!("cite"),
            },
            local_name!("pre") => HashSet::new(),
            local_name!("code") => HashSet::new(),
            local_name!("b") => HashSet::new(),
            local_name!("strong") => HashSet::new(),
            local_name!("i") => HashSet::new(),
            local_name!("em") => HashSet::new(),
            local_name!("u") => HashSet::new(),
            local_name!("s") => HashSet::new(),
            local_name!("del") => HashSet::new(),
            local_name!("sub") => HashSet::new(),
            local_name!("sup") => HashSet::new(),
            local_name!("small") => HashSet::new(),
            local_name!("mark") => HashSet::new(),
            local_name!("abbr") => hashset! {
                local_name!("title"),
            },
            local_name!("cite") => HashSet::new(),
            local_name!("q") => hashset! {
                local_name!("cite"),
            },
            local_name!("a") => hashset! {
                local_name!("href"),
                local_name!("name"),
            },
            local_name!("img") => hashset! {
                local_name!("src"),
                local_name!("alt"),
                local_name!("title"),
                local_name!("width"),
                local_name!("height"),
            },
            local_name!("ul") => HashSet::new(),
            local_name!("ol") => hashset! {
                local_name!("start"),
            },
            local_name!("li") => HashSet::new(),
            local_name!("dl") => HashSet::new(),
            local_name!("dt") => HashSet::new(),
            local_name!("dd") => HashSet::new(),
            local_name!("table") => HashSet::new(),
            local_name!("caption") => HashSet::new(),
            local_name!("thead") => HashSet::new(),
            local_name!("tbody") => HashSet::new(),
            local_name!("tfoot") => HashSet::new(),
            local_name!("tr") => HashSet::new(),
            local_name!("th") => hashset! {
                local_name!("colspan"),
                local_name!("rowspan"),
            },
            local_name!("td") => hashset! {
                local_name!("colspan"),
                local_name!("rowspan"),
            },
        },
        allowed_empty_elements: hashset! {
            local_name!("br"),
            local_name!("hr"),
            local_name!("img"),
            local_name!("td"),
            local_name!("th"),
        },
        allowed_attributes: hashset! {
            local_name!("id"),
        },
        scheme_restricted_attributes: hashset! {
            local_name!("href"),
            local_name!("src"),
            local_name!("cite"),
        },
        allowed_schemes: vec!["http://", "https://", "ftp://", "mailto:", "#", "./", "../"],
    };
}
