//! ItemStack: the payload this store was built for.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::consts::ITEM_MAX_STACK;
use crate::host::StageRecord;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    pub type_id: String,
    pub amount: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_tag: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lore: Vec<String>,
}

impl ItemStack {
    pub fn new(type_id: impl Into<String>, amount: u8) -> Self {
        Self {
            type_id: type_id.into(),
            amount,
            name_tag: None,
            lore: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name_tag = Some(name.into());
        self
    }

    pub fn with_lore(mut self, line: impl Into<String>) -> Self {
        self.lore.push(line.into());
        self
    }
}

impl StageRecord for ItemStack {
    fn normalized(&self) -> Self {
        let name_tag = self
            .name_tag
            .as_ref()
            .filter(|n| !n.trim().is_empty())
            .cloned();
        Self {
            type_id: self.type_id.clone(),
            amount: self.amount.clamp(1, ITEM_MAX_STACK),
            name_tag,
            lore: self.lore.iter().map(|l| l.trim_end().to_string()).collect(),
        }
    }
}

impl FromStr for ItemStack {
    type Err = anyhow::Error;

    /// "<type_id>[*<amount>]", e.g. "minecraft:diamond*3".
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (ty, amount) = match s.rsplit_once('*') {
            Some((ty, n)) => {
                let n: u8 = n
                    .trim()
                    .parse()
                    .map_err(|_| anyhow!("bad item amount in '{}'", s))?;
                (ty.trim(), n)
            }
            None => (s, 1),
        };
        if ty.is_empty() {
            return Err(anyhow!("empty item type in '{}'", s));
        }
        Ok(ItemStack::new(ty, amount))
    }
}

impl fmt::Display for ItemStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}*{}", self.type_id, self.amount)?;
        if let Some(n) = &self.name_tag {
            write!(f, " \"{}\"", n)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display() {
        let it: ItemStack = "minecraft:diamond*3".parse().unwrap();
        assert_eq!(it, ItemStack::new("minecraft:diamond", 3));
        assert_eq!(it.to_string(), "minecraft:diamond*3");

        let one: ItemStack = "minecraft:stick".parse().unwrap();
        assert_eq!(one.amount, 1);

        assert!("*3".parse::<ItemStack>().is_err());
        assert!("minecraft:stick*lots".parse::<ItemStack>().is_err());
    }

    #[test]
    fn normalization_clamps_and_trims() {
        let it = ItemStack::new("minecraft:dirt", 200)
            .with_name("   ")
            .with_lore("old  ");
        let n = it.normalized();
        assert_eq!(n.amount, ITEM_MAX_STACK);
        assert_eq!(n.name_tag, None);
        assert_eq!(n.lore, vec!["old".to_string()]);

        assert_eq!(ItemStack::new("minecraft:dirt", 0).normalized().amount, 1);
    }
}
