//! Link previews for bookmarked pages.
//!
//! [`MetadataClient::fetch`] never fails: any network, status, or decoding problem yields
//! [`PageMetadata::degraded`], which titles the page after its hostname.

use std::{collections::HashMap, sync::LazyLock, time::Duration};

use regex::Regex;
use reqwest::{Client, Url, redirect::Policy};
use serde::Serialize;

use crate::Result;

pub const TITLE_MAX_CHARS: usize = 200;
pub const DESCRIPTION_MAX_CHARS: usize = 500;

const TITLE_KEYS: [&str; 2] = ["og:title", "twitter:title"];
const DESCRIPTION_KEYS: [&str; 3] = ["og:description", "twitter:description", "description"];
const IMAGE_KEYS: [&str; 2] = ["og:image", "twitter:image"];
const ICON_RELS: [&str; 3] = ["icon", "shortcut icon", "apple-touch-icon"];

static META_TAG: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?is)<meta\b[^>]*>").expect("Meta pattern must compile."));
static LINK_TAG: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?is)<link\b[^>]*>").expect("Link pattern must compile."));
static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r#"(?is)([a-z][a-z0-9_:-]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#)
		.expect("Attribute pattern must compile.")
});
static TITLE_ELEMENT: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"(?is)<title\b[^>]*>(.*?)</title\s*>").expect("Title pattern must compile.")
});
static H1_ELEMENT: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"(?is)<h1\b[^>]*>(.*?)</h1\s*>").expect("Heading pattern must compile.")
});
static INNER_TAG: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("Tag pattern must compile."));

/// Empty strings mean "not found".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageMetadata {
	pub title: String,
	pub description: String,
	pub favicon: String,
	pub image: String,
}
impl PageMetadata {
	pub fn degraded(url: &str) -> Self {
		Self { title: stash_domain::url::host_title(url), ..Default::default() }
	}
}

pub struct MetadataClient {
	client: Client,
	enabled: bool,
}
impl MetadataClient {
	pub fn new(cfg: &stash_config::Metadata) -> Result<Self> {
		let client = Client::builder()
			.timeout(Duration::from_millis(cfg.timeout_ms))
			.redirect(Policy::limited(cfg.max_redirects))
			.user_agent(cfg.user_agent.as_str())
			.build()?;

		Ok(Self { client, enabled: cfg.enabled })
	}

	pub async fn fetch(&self, url: &str) -> PageMetadata {
		if !self.enabled {
			return PageMetadata::degraded(url);
		}

		match self.download(url).await {
			Ok((page_url, html)) => parse_html(&html, &page_url),
			Err(err) => {
				tracing::warn!(url, error = %err, "Metadata fetch failed; using hostname title.");

				PageMetadata::degraded(url)
			},
		}
	}

	async fn download(&self, url: &str) -> Result<(Url, String)> {
		let response = self.client.get(url).send().await?.error_for_status()?;
		let page_url = response.url().clone();
		let html = response.text().await?;

		Ok((page_url, html))
	}
}

/// Extracts metadata from `html` served at `page_url`.
///
/// Lookup order: Open Graph, then Twitter card, then the generic tag, then `<title>` and the
/// first `<h1>` for titles. Relative favicon and image references resolve against the page
/// origin.
pub fn parse_html(html: &str, page_url: &Url) -> PageMetadata {
	let metas = META_TAG.find_iter(html).map(|tag| attributes(tag.as_str())).collect::<Vec<_>>();
	let title = first_meta(&metas, &TITLE_KEYS, TITLE_MAX_CHARS)
		.or_else(|| element_text(&TITLE_ELEMENT, html, TITLE_MAX_CHARS))
		.or_else(|| element_text(&H1_ELEMENT, html, TITLE_MAX_CHARS))
		.unwrap_or_else(|| stash_domain::url::host_title(page_url.as_str()));
	let description =
		first_meta(&metas, &DESCRIPTION_KEYS, DESCRIPTION_MAX_CHARS).unwrap_or_default();
	let image = first_meta(&metas, &IMAGE_KEYS, usize::MAX)
		.map(|href| resolve(page_url, &href))
		.unwrap_or_default();
	let favicon = favicon_href(html).map(|href| resolve(page_url, &href)).unwrap_or_default();

	PageMetadata { title, description, favicon, image }
}

fn attributes(tag: &str) -> HashMap<String, String> {
	ATTRIBUTE
		.captures_iter(tag)
		.filter_map(|caps| {
			let name = caps.get(1)?.as_str().to_ascii_lowercase();
			let value = caps.get(2).or_else(|| caps.get(3)).or_else(|| caps.get(4))?;

			Some((name, decode_entities(value.as_str())))
		})
		.collect()
}

fn first_meta(metas: &[HashMap<String, String>], keys: &[&str], max_chars: usize) -> Option<String> {
	keys.iter().find_map(|key| {
		metas
			.iter()
			.filter(|attrs| {
				["property", "name"].iter().any(|attr| {
					attrs.get(*attr).is_some_and(|value| value.trim().eq_ignore_ascii_case(key))
				})
			})
			.find_map(|attrs| attrs.get("content").map(|content| clean(content, max_chars)))
			.filter(|content| !content.is_empty())
	})
}

fn element_text(pattern: &Regex, html: &str, max_chars: usize) -> Option<String> {
	let inner = pattern.captures(html)?.get(1)?.as_str();
	let text = clean(&decode_entities(&INNER_TAG.replace_all(inner, " ")), max_chars);

	if text.is_empty() { None } else { Some(text) }
}

fn favicon_href(html: &str) -> Option<String> {
	let links = LINK_TAG.find_iter(html).map(|tag| attributes(tag.as_str())).collect::<Vec<_>>();

	ICON_RELS.iter().find_map(|rel| {
		links.iter().find_map(|attrs| {
			let matches = attrs.get("rel").is_some_and(|value| {
				value.split_whitespace().collect::<Vec<_>>().join(" ").eq_ignore_ascii_case(rel)
			});

			attrs
				.get("href")
				.filter(|href| matches && !href.trim().is_empty())
				.map(|href| href.trim().to_string())
		})
	})
}

/// `//host/x` takes the page scheme, `/x` and `x` hang off the page origin.
fn resolve(page_url: &Url, href: &str) -> String {
	let origin = page_url.join("/").unwrap_or_else(|_| page_url.clone());

	origin.join(href).map(String::from).unwrap_or_default()
}

fn clean(raw: &str, max_chars: usize) -> String {
	raw.split_whitespace().collect::<Vec<_>>().join(" ").chars().take(max_chars).collect()
}

fn decode_entities(raw: &str) -> String {
	if !raw.contains('&') {
		return raw.to_string();
	}

	raw.replace("&lt;", "<")
		.replace("&gt;", ">")
		.replace("&quot;", "\"")
		.replace("&#39;", "'")
		.replace("&#x27;", "'")
		.replace("&apos;", "'")
		.replace("&nbsp;", " ")
		.replace("&amp;", "&")
}
