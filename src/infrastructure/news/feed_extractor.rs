//! Pattern-based RSS/Atom item extraction.
//!
//! Feeds in the wild are frequently not well-formed XML, so items are pulled
//! out with tolerant regexes instead of a strict parser.

use crate::domain::news::FeedItem;
use crate::domain::ports::FeedItemExtractor;
use chrono::{DateTime, Utc};
use regex::Regex;

pub struct PatternFeedExtractor {
    item: Regex,
    title: Regex,
    link_text: Regex,
    link_href: Regex,
    date: Regex,
    cdata: Regex,
    tag: Regex,
}

impl PatternFeedExtractor {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            item: Regex::new(r"(?is)<(?:item|entry)\b[^>]*>(.*?)</(?:item|entry)>")?,
            title: Regex::new(r"(?is)<title\b[^>]*>(.*?)</title>")?,
            link_text: Regex::new(r"(?is)<link\b[^>]*>(.*?)</link>")?,
            link_href: Regex::new(r#"(?is)<link\b[^>]*\bhref\s*=\s*["']([^"']+)["']"#)?,
            date: Regex::new(
                r"(?is)<(?:pubDate|published|updated|dc:date)\b[^>]*>(.*?)</(?:pubDate|published|updated|dc:date)>",
            )?,
            cdata: Regex::new(r"(?s)<!\[CDATA\[(.*?)\]\]>")?,
            tag: Regex::new(r"(?s)<[^>]+>")?,
        })
    }

    fn clean_text(&self, raw: &str) -> String {
        let unwrapped = self.cdata.replace_all(raw, "$1");
        let stripped = self.tag.replace_all(&unwrapped, " ");
        let decoded = decode_entities(&stripped);
        decoded.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    fn capture<'a>(re: &Regex, block: &'a str) -> Option<&'a str> {
        re.captures(block).and_then(|c| c.get(1)).map(|m| m.as_str())
    }
}

impl FeedItemExtractor for PatternFeedExtractor {
    fn extract(&self, raw_markup: &str) -> Vec<FeedItem> {
        self.item
            .captures_iter(raw_markup)
            .filter_map(|caps| {
                let block = caps.get(1)?.as_str();
                let title = self.clean_text(Self::capture(&self.title, block)?);
                if title.is_empty() {
                    return None;
                }

                let link = Self::capture(&self.link_text, block)
                    .map(|l| self.clean_text(l))
                    .filter(|l| !l.is_empty())
                    .or_else(|| Self::capture(&self.link_href, block).map(decode_entities));

                let published_at = Self::capture(&self.date, block)
                    .map(|d| self.clean_text(d))
                    .and_then(|d| parse_feed_date(&d));

                Some(FeedItem {
                    title,
                    link,
                    published_at,
                })
            })
            .collect()
    }
}

/// RSS uses RFC 2822 dates, Atom uses RFC 3339.
pub fn parse_feed_date(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(raw)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

fn decode_entities(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&#8217;", "\u{2019}")
        .replace("&#8216;", "\u{2018}")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    const RSS_FIXTURE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel>
  <title>Crypto News</title>
  <item>
    <title><![CDATA[Exchange hacked for $40M &amp; withdrawals paused]]></title>
    <link>https://news.example.com/a</link>
    <pubDate>Tue, 11 Jun 2024 10:15:00 +0000</pubDate>
  </item>
  <item>
    <title>SEC delays ETF decision</title>
    <link>https://news.example.com/b</link>
    <pubDate>not a date</pubDate>
  </item>
  <item>
    <description>no title here</description>
  </item>
</channel></rss>"#;

    const ATOM_FIXTURE: &str = r#"<feed xmlns="http://www.w3.org/2005/Atom">
  <entry>
    <title type="html">Fed holds rates &lt;steady&gt;</title>
    <link rel="alternate" href="https://atom.example.com/x"/>
    <published>2024-06-11T08:00:00Z</published>
  </entry>
</feed>"#;

    #[test]
    fn test_extracts_rss_items() {
        let extractor = PatternFeedExtractor::new().unwrap();
        let items = extractor.extract(RSS_FIXTURE);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "Exchange hacked for $40M & withdrawals paused");
        assert_eq!(items[0].link.as_deref(), Some("https://news.example.com/a"));
        assert_eq!(
            items[0].published_at.map(|d| d.to_rfc3339()),
            Some("2024-06-11T10:15:00+00:00".to_string())
        );
        assert!(items[1].published_at.is_none());
    }

    #[test]
    fn test_extracts_atom_entries() {
        let extractor = PatternFeedExtractor::new().unwrap();
        let items = extractor.extract(ATOM_FIXTURE);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Fed holds rates <steady>");
        assert_eq!(items[0].link.as_deref(), Some("https://atom.example.com/x"));
        assert!(items[0].published_at.is_some());
    }

    #[test]
    fn test_garbage_yields_nothing() {
        let extractor = PatternFeedExtractor::new().unwrap();
        assert!(extractor.extract("<html><body>502 Bad Gateway</body></html>").is_empty());
        assert!(extractor.extract("").is_empty());
    }
}
