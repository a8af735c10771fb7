//! Built-in suggestion lists for the source, medium and campaign fields.

use serde::{Deserialize, Serialize};

use super::UtmParam;

/// A suggested value and the label shown next to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset {
    pub value: String,
    pub label: String,
}

type Builtin = (&'static str, &'static str);

pub const SOURCES: &[Builtin] = &[
    ("google", "Google"),
    ("yandex", "Yandex"),
    ("facebook", "Facebook"),
    ("vk", "VK"),
    ("instagram", "Instagram"),
    ("email", "Email"),
    ("telegram", "Telegram"),
    ("youtube", "YouTube"),
];

pub const MEDIUMS: &[Builtin] = &[
    ("cpc", "CPC (search ads)"),
    ("cpm", "CPM (banners)"),
    ("social", "Social"),
    ("email", "Email (newsletter)"),
    ("referral", "Referral"),
    ("organic", "Organic"),
];

pub const CAMPAIGNS: &[Builtin] = &[
    ("spring_sale", "Spring sale"),
    ("black_friday", "Black Friday"),
    ("new_product", "New product"),
    ("promo", "Promo"),
    ("brand", "Brand campaign"),
];

/// Built-in suggestions for `param`. `term` and `content` have none.
pub fn builtin_for(param: UtmParam) -> &'static [Builtin] {
    match param {
        UtmParam::Source => SOURCES,
        UtmParam::Medium => MEDIUMS,
        UtmParam::Campaign => CAMPAIGNS,
        UtmParam::Term | UtmParam::Content => &[],
    }
}

/// Built-ins for `param` followed by `extra`, skipping extra values that
/// repeat an earlier one.
pub fn presets_for(param: UtmParam, extra: &[Preset]) -> Vec<Preset> {
    let mut list: Vec<Preset> = builtin_for(param)
        .iter()
        .map(|(value, label)| Preset {
            value: value.to_string(),
            label: label.to_string(),
        })
        .collect();

    for preset in extra {
        if preset.value.is_empty() || list.iter().any(|p| p.value == preset.value) {
            continue;
        }
        list.push(preset.clone());
    }

    list
}
