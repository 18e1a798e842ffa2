//! Extraction of the same records from public HTML pages.
//!
//! These parsers are used when the REST API refuses to answer, and for the few facts the
//! API does not expose at all (contributor graphs, profile bios, social preview images).
//! They work on raw markup with targeted regular expressions and never fail: anything
//! that cannot be found is reported as absent and filled in by the normalizer's defaults.

use super::repository::ApiRepository;
use super::team::ProfileDetails;
use chrono::{DateTime, Utc};
use regex::{Captures, Regex};
use std::collections::{BTreeSet, HashSet};
use std::sync::LazyLock;

static OWNS_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"itemprop="owns""#).expect("invalid regex"));

static CODE_REPOSITORY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<a\b([^>]*\bitemprop="[^"]*\bcodeRepository\b[^"]*"[^>]*)>([\s\S]*?)</a>"#).expect("invalid regex")
});

static HREF_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"\bhref="([^"]*)""#).expect("invalid regex"));

static DESCRIPTION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"itemprop="description"[^>]*>([\s\S]*?)</p>"#).expect("invalid regex"));

static LANGUAGE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"itemprop="programmingLanguage"[^>]*>([\s\S]*?)</span>"#).expect("invalid regex"));

static STARGAZERS_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<a\b[^>]*\bhref="[^"]*/stargazers"[^>]*>([\s\S]*?)</a>"#).expect("invalid regex"));

static FORKS_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<a\b[^>]*\bhref="[^"]*/(?:forks|network/members)"[^>]*>([\s\S]*?)</a>"#).expect("invalid regex")
});

static RELATIVE_TIME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<relative-time\b[^>]*\bdatetime="([^"]+)""#).expect("invalid regex"));

static TOPIC_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<a\b[^>]*\btopic-tag\b[^>]*>([\s\S]*?)</a>"#).expect("invalid regex"));

static ANCHOR_TAG_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<a\b[^>]*>").expect("invalid regex"));

static META_TAG_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<meta\b[^>]*>").expect("invalid regex"));

static CONTENT_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"\bcontent="([^"]*)""#).expect("invalid regex"));

static PROFILE_NAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"itemprop="name"[^>]*>([\s\S]*?)</span>"#).expect("invalid regex"));

static BIO_ATTRIBUTE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"\bdata-bio-text="([^"]*)""#).expect("invalid regex"));

static BIO_BLOCK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<div\b[^>]*\buser-profile-bio\b[^>]*>([\s\S]*?)</div>").expect("invalid regex"));

static TAG_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("invalid regex"));

static ENTITY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z]{2,8});").expect("invalid regex"));

static WHITESPACE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("invalid regex"));

/// Parse a user's repository listing page (`/{owner}?tab=repositories`).
///
/// The page is split into one block per `itemprop="owns"` element. Blocks without a
/// repository link are skipped. Ids are synthetic (position in the page, starting at 1)
/// since the page does not expose the numeric ids. Forked repositories are reported with
/// `fork` set so normalization can drop them.
#[must_use]
pub fn parse_repository_listing(html: &str, owner: &str, web_base_url: &str) -> Vec<ApiRepository> {
    let starts: Vec<usize> = OWNS_REGEX.find_iter(html).map(|m| m.start()).collect();
    let web_base_url = web_base_url.trim_end_matches('/');

    starts
        .iter()
        .enumerate()
        .filter_map(|(index, &start)| {
            let end = starts.get(index + 1).copied().unwrap_or(html.len());
            html.get(start..end)
        })
        .filter_map(|block| parse_repository_block(block, owner, web_base_url))
        .enumerate()
        .map(|(position, mut repo)| {
            repo.id = u64::try_from(position + 1).unwrap_or(u64::MAX);
            repo
        })
        .collect()
}

fn parse_repository_block(block: &str, owner: &str, web_base_url: &str) -> Option<ApiRepository> {
    let link = CODE_REPOSITORY_REGEX.captures(block)?;

    let from_href = HREF_REGEX
        .captures(&link[1])
        .and_then(|c| last_path_segment(&c[1]).map(str::to_string));
    let name = from_href.unwrap_or_else(|| clean_text(&link[2]));
    if name.is_empty() {
        return None;
    }

    let full_name = format!("{owner}/{name}");
    let mut seen_topics = HashSet::new();

    Some(ApiRepository {
        id: 0,
        html_url: format!("{web_base_url}/{full_name}"),
        description: first_capture_text(&DESCRIPTION_REGEX, block),
        language: first_capture_text(&LANGUAGE_REGEX, block),
        stargazers_count: STARGAZERS_REGEX.captures(block).map_or(0, |c| parse_count(&c[1])),
        forks_count: FORKS_REGEX.captures(block).map_or(0, |c| parse_count(&c[1])),
        updated_at: RELATIVE_TIME_REGEX.captures(block).and_then(|c| parse_timestamp(&c[1])),
        archived: block.contains("Public archive"),
        fork: block.contains("Forked from"),
        topics: TOPIC_REGEX
            .captures_iter(block)
            .map(|c| clean_text(&c[1]))
            .filter(|t| !t.is_empty() && seen_topics.insert(t.clone()))
            .collect(),
        name,
        full_name,
        ..ApiRepository::default()
    })
}

/// Extract the logins of everyone linked as a user on a contributors page.
#[must_use]
pub fn parse_contributors(html: &str) -> BTreeSet<String> {
    ANCHOR_TAG_REGEX
        .find_iter(html)
        .map(|m| m.as_str())
        .filter(|tag| tag.contains(r#"data-hovercard-type="user""#))
        .filter_map(|tag| HREF_REGEX.captures(tag))
        .filter_map(|c| last_path_segment(&c[1]).map(str::to_string))
        .filter(|login| is_valid_login(login))
        .collect()
}

/// Extract the display name and bio from a profile page.
#[must_use]
pub fn parse_profile(html: &str) -> ProfileDetails {
    let name = first_capture_text(&PROFILE_NAME_REGEX, html).unwrap_or_default();
    let bio = first_capture_text(&BIO_ATTRIBUTE_REGEX, html)
        .or_else(|| first_capture_text(&BIO_BLOCK_REGEX, html))
        .unwrap_or_default();

    ProfileDetails { name, bio }
}

/// Extract the `og:image` URL from a repository page.
#[must_use]
pub fn parse_social_preview(html: &str) -> Option<String> {
    META_TAG_REGEX
        .find_iter(html)
        .map(|m| m.as_str())
        .filter(|tag| tag.contains(r#"property="og:image""#))
        .find_map(|tag| CONTENT_REGEX.captures(tag))
        .map(|c| decode_entities(c[1].trim()))
        .filter(|url| !url.is_empty())
}

/// Parse a displayed counter such as `1,234`, `12 345` or `1.2k`. Unreadable text counts as zero.
#[must_use]
pub fn parse_count(text: &str) -> u64 {
    let cleaned: String = clean_text(text)
        .chars()
        .filter(|c| !matches!(c, ',' | ' ' | '_'))
        .collect::<String>()
        .to_ascii_lowercase();

    let (number, multiplier) = if let Some(n) = cleaned.strip_suffix('k') {
        (n, 1_000)
    } else if let Some(n) = cleaned.strip_suffix('m') {
        (n, 1_000_000)
    } else {
        (cleaned.as_str(), 1)
    };

    let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));
    let Ok(whole) = whole.parse::<u64>() else {
        return 0;
    };

    // only the digits that still matter at this magnitude
    let mut fraction_value = 0;
    let mut scale = multiplier;
    for digit in fraction.chars().map_while(|c| c.to_digit(10)) {
        scale /= 10;
        if scale == 0 {
            break;
        }
        fraction_value += u64::from(digit) * scale;
    }

    whole.saturating_mul(multiplier).saturating_add(fraction_value)
}

/// Strip tags, decode entities and collapse whitespace.
#[must_use]
pub fn clean_text(html: &str) -> String {
    let without_tags = TAG_REGEX.replace_all(html, " ");
    let decoded = decode_entities(&without_tags);
    WHITESPACE_REGEX.replace_all(&decoded, " ").trim().to_string()
}

fn decode_entities(text: &str) -> String {
    ENTITY_REGEX
        .replace_all(text, |caps: &Captures<'_>| {
            let entity = &caps[1];
            let decoded = if let Some(hex) = entity.strip_prefix("#x").or_else(|| entity.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = entity.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                match entity {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "nbsp" => Some(' '),
                    _ => None,
                }
            };

            decoded.map_or_else(|| caps[0].to_string(), |c| c.to_string())
        })
        .into_owned()
}

fn first_capture_text(regex: &Regex, html: &str) -> Option<String> {
    regex.captures(html).map(|c| clean_text(&c[1])).filter(|t| !t.is_empty())
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim()).ok().map(|dt| dt.with_timezone(&Utc))
}

fn last_path_segment(href: &str) -> Option<&str> {
    let path = href.split(['?', '#']).next().unwrap_or_default();
    path.trim_end_matches('/').rsplit('/').next().filter(|s| !s.is_empty())
}

fn is_valid_login(login: &str) -> bool {
    !login.starts_with('-') && login.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}
