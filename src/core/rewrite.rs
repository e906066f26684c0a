//! Sales program names
//!
//! The accounting system expects every promotion to be registered under a
//! sales program name ending in ` - NP - E`. Retail-brand promotions also
//! carry the store the quantity belongs to, with the brand abbreviated.

use crate::config::{Markers, RewriteRule};
use crate::core::random::Chooser;
use crate::error::{SalesPgmError, SalesPgmResult};
use regex::Regex;

/// Fixed tail of every sales program name
pub const PROGRAM_SUFFIX: &str = " - NP - E";

/// Builds sales program names from (promotion name, customer name)
pub struct PromotionRewriter {
    rule: RewriteRule,
    brand: String,
    abbreviation: String,
    /// Promotion codes: two letters and 4-5 digits, e.g. `AB12345`
    code_pattern: Regex,
    /// First whitespace-led abbreviation or brand in a promotion name
    prefix_stop: Regex,
    /// `{name} - Z123` program-number tails
    z_tail: Regex,
    /// Brand or spaced brand in any case, or the upper-case abbreviation,
    /// as a whole word
    promo_marker: Regex,
    /// Brand or spaced brand inside customer names, any case
    customer_marker: Regex,
    /// Trailing `- UPDATE` / `- RECREATE` status markers
    status_tail: Regex,
}

fn compile(pattern: &str) -> SalesPgmResult<Regex> {
    Regex::new(pattern).map_err(|e| SalesPgmError::Config(format!("Regex error: {}", e)))
}

impl PromotionRewriter {
    pub fn new(rule: RewriteRule, markers: &Markers) -> SalesPgmResult<Self> {
        let brand = regex::escape(&markers.brand);
        let spaced = regex::escape(&markers.brand_spaced);
        let abbr = regex::escape(&markers.abbreviation);

        Ok(Self {
            rule,
            brand: markers.brand.clone(),
            abbreviation: markers.abbreviation.clone(),
            code_pattern: compile(r"\b[A-Za-z]{2}\d{4,5}\b")?,
            prefix_stop: compile(&format!(r"\s(?:{}|{})", abbr, brand))?,
            z_tail: compile(r"^(.*?)\s*-\s*Z\d+")?,
            promo_marker: compile(&format!(r"\b(?:(?i:{}|{})|{})\b", brand, spaced, abbr))?,
            customer_marker: compile(&format!(r"(?i)(?:{}|{})", brand, spaced))?,
            status_tail: compile(r"(?i)\s*-\s*(?:UPDATE|RECREATE)\s*$")?,
        })
    }

    /// Sales program name for one row
    pub fn rewrite(&self, promotion: &str, customer: &str, chooser: &mut dyn Chooser) -> String {
        match self.rule {
            RewriteRule::CodeSuffix => self.code_suffix(promotion, customer),
            RewriteRule::CustomerInsert => self.customer_insert(promotion, customer, chooser),
        }
    }

    /// Promotion code token (`AB1234`), if the promotion name has one
    pub fn promotion_code<'a>(&self, promotion: &'a str) -> Option<&'a str> {
        self.code_pattern.find(promotion).map(|m| m.as_str())
    }

    fn code_suffix(&self, promotion: &str, customer: &str) -> String {
        if !customer.contains(&self.brand) {
            return format!("{}{}", promotion, PROGRAM_SUFFIX);
        }

        let prefix = match self.prefix_stop.find(promotion) {
            Some(m) => &promotion[..m.start()],
            None => promotion.trim_end(),
        };
        let store = customer
            .rsplit_once(self.brand.as_str())
            .map(|(_, tail)| tail.trim())
            .unwrap_or("");

        let name = format!("{} {} {}", prefix, self.abbreviation, store);
        let name = name.trim();
        match self.promotion_code(promotion) {
            Some(code) => format!("{} - {}{}", name, code, PROGRAM_SUFFIX),
            None => format!("{}{}", name, PROGRAM_SUFFIX),
        }
    }

    fn customer_insert(&self, promotion: &str, customer: &str, chooser: &mut dyn Chooser) -> String {
        let base = self
            .z_tail
            .captures(promotion)
            .and_then(|c| c.get(1))
            .map_or(promotion, |m| m.as_str())
            .trim();

        let stores = self.store_names(customer);
        let store = match stores.len() {
            0 => None,
            1 => Some(stores[0].as_str()),
            n => Some(stores[chooser.choose_index(n)].as_str()),
        };

        let mut name = match self.promo_marker.find(base) {
            Some(first) => {
                let mut out = String::with_capacity(base.len() + 16);
                out.push_str(&base[..first.start()]);
                out.push_str(&self.abbreviation);
                if let Some(store) = store.filter(|s| !s.is_empty()) {
                    out.push(' ');
                    out.push_str(store);
                }
                let rest = self
                    .promo_marker
                    .replace_all(&base[first.end()..], self.abbreviation.as_str());
                out.push_str(&rest);
                out
            }
            None => base.to_string(),
        };

        while let Some(m) = self.status_tail.find(&name) {
            name.truncate(m.start());
        }

        format!("{}{}", name.trim(), PROGRAM_SUFFIX)
    }

    /// Store names following each brand occurrence in a customer name.
    /// `"MEDIAMARKT BERLIN / MEDIA MARKT HAMBURG"` → `["BERLIN", "HAMBURG"]`
    pub fn store_names(&self, customer: &str) -> Vec<String> {
        let hits: Vec<_> = self.customer_marker.find_iter(customer).collect();
        hits.iter()
            .enumerate()
            .map(|(i, m)| {
                let end = hits.get(i + 1).map_or(customer.len(), |next| next.start());
                customer[m.end()..end]
                    .trim_matches(|c: char| c.is_whitespace() || "-/,;&|".contains(c))
                    .to_string()
            })
            .collect()
    }
}
