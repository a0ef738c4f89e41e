//! Asset path rewrite rules.
//!
//! Artwork moved from `systems/<id>/artwork/icons/` to
//! `systems/<id>/assets/icons/`. Any text before the legacy prefix is kept,
//! so module-relative paths rewrite the same way as bare ones.

use coc7_domain::{Document, ItemType, Patch};
use regex_lite::Regex;
use serde_json::Value;

use super::{collection_entries, RuleId, RuleOutcome};

/// Rewrites legacy system icon paths.
#[derive(Debug, Clone)]
pub struct AssetPathRewriter {
    legacy: Regex,
    current_prefix: String,
}

impl AssetPathRewriter {
    pub fn new(system_id: &str) -> Result<Self, regex_lite::Error> {
        let legacy = Regex::new(&format!(
            r"systems/{}/artwork/icons/(.+)",
            regex_lite::escape(system_id)
        ))?;
        Ok(Self {
            legacy,
            current_prefix: format!("systems/{system_id}/assets/icons/"),
        })
    }

    /// The rewritten path, or `None` when `path` is not a legacy icon path.
    ///
    /// Every legacy prefix in the path is rewritten, so the result never
    /// matches again.
    pub fn rewrite(&self, path: &str) -> Option<String> {
        let mut current = self.rewrite_once(path)?;
        while let Some(next) = self.rewrite_once(&current) {
            current = next;
        }
        Some(current)
    }

    fn rewrite_once(&self, path: &str) -> Option<String> {
        let caps = self.legacy.captures(path)?;
        let whole = caps.get(0)?;
        let file = caps.get(1)?;
        Some(format!(
            "{}{}{}",
            &path[..whole.start()],
            self.current_prefix,
            file.as_str()
        ))
    }

    fn rewrite_into(&self, patch: &mut Patch, path: String, current: Option<&str>) {
        if let Some(rewritten) = current.and_then(|c| self.rewrite(c)) {
            patch.set(path, Value::String(rewritten));
        }
    }
}

pub(super) fn actor_artwork(assets: &AssetPathRewriter, doc: &Document) -> RuleOutcome {
    let mut patch = Patch::new();
    assets.rewrite_into(&mut patch, "img".to_string(), doc.img.as_deref());
    assets.rewrite_into(&mut patch, "token.img".to_string(), doc.token_img());
    for (i, effect) in doc.effects.iter().enumerate() {
        assets.rewrite_into(&mut patch, format!("effects.{i}.icon"), effect.icon.as_deref());
    }
    Ok(patch)
}

pub(super) fn item_artwork(assets: &AssetPathRewriter, doc: &Document) -> RuleOutcome {
    let rule = RuleId::ItemArtwork;
    let mut patch = Patch::new();
    assets.rewrite_into(&mut patch, "img".to_string(), doc.img.as_deref());

    let nested: &[&str] = match doc.item_type() {
        Some(ItemType::Setup) => &["items"],
        Some(ItemType::Occupation) => &["skills"],
        Some(ItemType::Book) => &["spells"],
        Some(ItemType::Archetype) => &["skills"],
        _ => &[],
    };
    for container in nested {
        rewrite_collection(assets, &mut patch, rule, doc, container)?;
    }

    if doc.item_type() == Some(&ItemType::Occupation) {
        if let Some(groups) = collection_entries(rule, doc, "groups")? {
            for (group, _) in groups {
                rewrite_collection(assets, &mut patch, rule, doc, &format!("groups.{group}.skills"))?;
            }
        }
    }
    Ok(patch)
}

fn rewrite_collection(
    assets: &AssetPathRewriter,
    patch: &mut Patch,
    rule: RuleId,
    doc: &Document,
    container: &str,
) -> Result<(), super::RuleSkipped> {
    if let Some(entries) = collection_entries(rule, doc, container)? {
        for (key, entry) in entries {
            assets.rewrite_into(
                patch,
                format!("data.{container}.{key}.img"),
                entry.get("img").and_then(Value::as_str),
            );
        }
    }
    Ok(())
}

pub(super) fn table_artwork(assets: &AssetPathRewriter, doc: &Document) -> Patch {
    let mut patch = Patch::new();
    assets.rewrite_into(&mut patch, "img".to_string(), doc.img.as_deref());
    for (i, result) in doc.results.iter().enumerate() {
        assets.rewrite_into(&mut patch, format!("results.{i}.img"), result.img.as_deref());
    }
    patch
}

pub(super) fn macro_artwork(assets: &AssetPathRewriter, doc: &Document) -> Patch {
    let mut patch = Patch::new();
    assets.rewrite_into(&mut patch, "img".to_string(), doc.img.as_deref());
    patch
}
