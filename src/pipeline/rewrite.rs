//! Tag Rewrite Module
//!
//! Turns matched `<img>` tags into a placeholder-plus-responsive-image
//! block. Matching is a tag-level pattern, not a DOM: anything the pattern
//! does not recognize passes through byte-for-byte.

use std::sync::LazyLock;

use regex::Regex;

use crate::config::Config;
use crate::locator;
use crate::models::FetchResult;
use crate::pipeline::DedupScheduler;

/// Matches an `<img>` tag and captures its `src` attribute.
static IMG_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<img[^>]+src="(.+?)"[^>]*>"#).expect("img tag pattern"));

/// Strips the leading `<img` of a matched tag.
static LEADING_IMG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^<img\s+").expect("leading img pattern"));

/// Strips the closing `>` (or `/>`) of a matched tag.
static TRAILING_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*/?>$").expect("trailing close pattern"));

/// Strips the original `src` attribute.
static SRC_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"src="[^"]*"\s*"#).expect("src attribute pattern"));

/// Stylesheet for the rewritten markup: the placeholder sits on top of the
/// real image and fades out once the `loaded` class lands.
pub const PROGRESSIVE_CSS: &str = "\
.progressive_img_container {
  position: relative;
  display: block;
  overflow: hidden;
}
.progressive_img_container > img {
  display: block;
  width: 100%;
  height: auto;
}
.progressive_img_container > .thumbhash-placeholder {
  position: absolute;
  top: 0;
  left: 0;
  width: 100%;
  height: 100%;
  object-fit: cover;
  transition: opacity 0.4s ease-out;
}
.progressive_img_container > img.loaded + .thumbhash-placeholder {
  opacity: 0;
  pointer-events: none;
}
";

// == Eligibility ==
/// Returns true when a locator should be processed: it must contain one of
/// the supported domains and its extension must not be excluded.
pub fn is_supported(image_url: &str, supported_domains: &[String], exclude_formats: &[String]) -> bool {
    let has_supported_domain = supported_domains
        .iter()
        .any(|domain| image_url.contains(domain.as_str()));
    let extension = locator::extension(image_url);
    has_supported_domain && !exclude_formats.iter().any(|format| *format == extension)
}

// == Document Transform ==
/// Rewrites every eligible `<img>` tag of one rendered document.
///
/// Locators are extracted in document order, resolved through the
/// scheduler (one fetch per unique locator), and the results are spliced
/// back by position, so duplicate tags share one resolution.
pub async fn transform_html(html: &str, config: &Config, scheduler: &DedupScheduler) -> String {
    let matches: Vec<(std::ops::Range<usize>, &str, &str)> = IMG_TAG
        .captures_iter(html)
        .filter_map(|caps| {
            let full = caps.get(0)?;
            let src = caps.get(1)?;
            Some((full.range(), full.as_str(), src.as_str()))
        })
        .collect();

    let locators: Vec<String> = matches.iter().map(|(_, _, src)| src.to_string()).collect();
    let results = scheduler
        .resolve(&locators, |loc| {
            is_supported(loc, &config.supported_domains, &config.exclude_formats)
        })
        .await;

    let mut output = String::with_capacity(html.len());
    let mut cursor = 0;
    let mut eligible_count = 0usize;

    for ((range, matched, src), result) in matches.into_iter().zip(results) {
        output.push_str(&html[cursor..range.start]);
        match result {
            Some(result) => {
                eligible_count += 1;
                let lazy = config.enable_lazy_loading && eligible_count > config.lazy_skip_first;
                output.push_str(&build_image_html(matched, src, config, lazy, &result));
            }
            None => output.push_str(matched),
        }
        cursor = range.end;
    }
    output.push_str(&html[cursor..]);
    output
}

// == Tag Assembly ==
/// Builds the replacement markup for one eligible tag.
fn build_image_html(
    matched: &str,
    src: &str,
    config: &Config,
    lazy: bool,
    result: &FetchResult,
) -> String {
    let separator = if src.contains('?') { '&' } else { '?' };
    let srcset = config
        .srcset_widths
        .iter()
        .map(|width| format!("{src}{separator}w={width} {width}w"))
        .collect::<Vec<_>>()
        .join(", ");

    // Original attributes survive, minus the src we are replacing
    let without_lead = LEADING_IMG.replace(matched, "");
    let without_close = TRAILING_CLOSE.replace(&without_lead, "");
    let clean_attributes = SRC_ATTR.replace(&without_close, "").trim().to_string();

    let mut parts = vec![format!(r#"<img src="{src}" srcset="{srcset}""#)];
    if let Some(dims) = result.dimensions {
        parts.push(format!(r#"width="{}" height="{}""#, dims.width, dims.height));
    }
    if config.add_max_width {
        parts.push(format!(r#"sizes="{}""#, config.max_widths));
    }
    if lazy {
        parts.push(r#"loading="lazy""#.to_string());
    }
    parts.push(r#"onload="this.classList.add('loaded')""#.to_string());
    if !clean_attributes.is_empty() {
        parts.push(clean_attributes);
    }
    let img_tag = format!("{}>", parts.join(" "));

    let placeholder = match &result.data_url {
        Some(data_url) => format!(r#"<img class="thumbhash-placeholder" src="{data_url}">"#),
        None => String::new(),
    };

    format!(r#"<div class="progressive_img_container">{img_tag}{placeholder}</div>"#)
}
