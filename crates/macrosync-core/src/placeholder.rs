// ── Placeholder substitution in macro templates ──

use indexmap::IndexMap;

const DEFAULT_TENANT: &str = "default_tenant";
const DEFAULT_SITE: &str = "default_site";

/// Identifiers available to template values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaceholderIds {
    pub tenant_id: Option<u64>,
    pub device_id: u64,
    pub site_id: Option<u64>,
}

impl PlaceholderIds {
    fn tokens(&self) -> [(&'static str, String); 4] {
        let tenant = self
            .tenant_id
            .map_or_else(|| DEFAULT_TENANT.to_owned(), |id| id.to_string());
        let site = self
            .site_id
            .map_or_else(|| DEFAULT_SITE.to_owned(), |id| id.to_string());
        [
            // Misspelling is what existing templates use.
            ("-TENENT_ID-", tenant.clone()),
            ("-TENANT_ID-", tenant),
            ("-DEVICE_ID-", self.device_id.to_string()),
            ("-SITE_ID-", site),
        ]
    }
}

/// Replace every known token in `value`. Unknown tokens are left as-is.
pub fn substitute(value: &str, ids: &PlaceholderIds) -> String {
    ids.tokens()
        .iter()
        .fold(value.to_owned(), |acc, (token, with)| acc.replace(token, with))
}

/// Apply [`substitute`] to every value of a template, keeping key order.
pub fn substitute_template(
    template: &IndexMap<String, String>,
    ids: &PlaceholderIds,
) -> IndexMap<String, String> {
    template
        .iter()
        .map(|(name, value)| (name.clone(), substitute(value, ids)))
        .collect()
}
