use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// 常用的嵌入颜色
pub mod color {
    pub const DARK_RED: u32 = 0x992D22;
    pub const RED: u32 = 0xE74C3C;
    pub const ORANGE: u32 = 0xE67E22;
    pub const GOLD: u32 = 0xF1C40F;
    pub const GREEN: u32 = 0x2ECC71;
    pub const BLUE: u32 = 0x3498DB;
    pub const PURPLE: u32 = 0x9B59B6;
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub inline: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EmbedFooter {
    pub text: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Embed {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub color: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    #[serde(default)]
    pub fields: Vec<EmbedField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub footer: Option<EmbedFooter>,
}

impl Embed {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    pub fn color(mut self, color: u32) -> Self {
        self.color = Some(color);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
            inline,
        });
        self
    }

    pub fn footer(mut self, text: impl Into<String>) -> Self {
        self.footer = Some(EmbedFooter { text: text.into() });
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ButtonStyle {
    Primary = 1,
    Secondary = 2,
    Success = 3,
    Danger = 4,
}

impl Serialize for ButtonStyle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(*self as u8)
    }
}

impl<'de> Deserialize<'de> for ButtonStyle {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match u8::deserialize(deserializer)? {
            1 => Ok(Self::Primary),
            2 => Ok(Self::Secondary),
            3 => Ok(Self::Success),
            4 => Ok(Self::Danger),
            other => Err(serde::de::Error::custom(format!("unsupported button style {other}"))),
        }
    }
}

const ACTION_ROW: u8 = 1;
const BUTTON: u8 = 2;

/// 交互按钮，只支持带 custom_id 的按钮
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Button {
    #[serde(rename = "type")]
    kind: u8,
    pub style: ButtonStyle,
    pub label: String,
    pub custom_id: String,
    #[serde(default)]
    pub disabled: bool,
}

impl Button {
    pub fn new(style: ButtonStyle, label: impl Into<String>, custom_id: impl Into<String>) -> Self {
        Self {
            kind: BUTTON,
            style,
            label: label.into(),
            custom_id: custom_id.into(),
            disabled: false,
        }
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ActionRow {
    #[serde(rename = "type")]
    kind: u8,
    pub components: Vec<Button>,
}

impl ActionRow {
    pub fn new(components: Vec<Button>) -> Self {
        Self {
            kind: ACTION_ROW,
            components,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_components_serialize() {
        let row = ActionRow::new(vec![
            Button::new(ButtonStyle::Success, "Start", "party:start").disabled(true),
        ]);
        assert_eq!(
            serde_json::to_string(&row).unwrap(),
            r#"{"type":1,"components":[{"type":2,"style":3,"label":"Start","custom_id":"party:start","disabled":true}]}"#
        );
    }

    #[test]
    fn test_embed_skips_empty_parts() {
        let embed = Embed::new("Bans").color(color::DARK_RED);
        assert_eq!(
            serde_json::to_string(&embed).unwrap(),
            r#"{"title":"Bans","color":10038562}"#
        );
    }
}
