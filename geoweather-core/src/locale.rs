use std::env;

/// Environment variables consulted for the locale, in priority order.
const LOCALE_VARS: &[&str] = &["LC_ALL", "LC_MESSAGES", "LANG"];

/// Region of a POSIX or BCP 47 locale tag, upper-cased.
///
/// `en_US.UTF-8` and `en-US` both give `US`; a script subtag is skipped, so
/// `my-Mymr-MM` gives `MM`. `C`, `POSIX` and bare language tags give `None`.
pub fn country_from_locale_tag(tag: &str) -> Option<String> {
    let tag = tag.split(['.', '@']).next().unwrap_or_default();

    tag.split(['_', '-'])
        .skip(1)
        .find(|subtag| subtag.len() == 2 && subtag.chars().all(|c| c.is_ascii_alphabetic()))
        .map(str::to_ascii_uppercase)
}

/// Country code of the current process locale, if one is set.
pub fn system_country() -> Option<String> {
    LOCALE_VARS
        .iter()
        .filter_map(|var| env::var(var).ok())
        .find(|value| !value.is_empty())
        .and_then(|value| country_from_locale_tag(&value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn posix_and_bcp47_tags() {
        assert_eq!(country_from_locale_tag("en_US.UTF-8").as_deref(), Some("US"));
        assert_eq!(country_from_locale_tag("my_MM").as_deref(), Some("MM"));
        assert_eq!(country_from_locale_tag("de-de").as_deref(), Some("DE"));
        assert_eq!(country_from_locale_tag("sr_RS@latin").as_deref(), Some("RS"));
    }

    #[test]
    fn script_subtag_is_skipped() {
        assert_eq!(country_from_locale_tag("zh_Hans_CN").as_deref(), Some("CN"));
        assert_eq!(country_from_locale_tag("my-Mymr-MM").as_deref(), Some("MM"));
        assert_eq!(country_from_locale_tag("sr-Latn").as_deref(), None);
    }

    #[test]
    fn tags_without_region() {
        assert_eq!(country_from_locale_tag("C"), None);
        assert_eq!(country_from_locale_tag("POSIX"), None);
        assert_eq!(country_from_locale_tag("fr"), None);
        assert_eq!(country_from_locale_tag(""), None);
    }
}
