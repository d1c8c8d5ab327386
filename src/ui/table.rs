use tabled::{settings::Style, Table, Tabled};

use crate::cursor::Channel;

#[derive(Tabled)]
pub struct ChannelRow {
    #[tabled(rename = "ID")]
    pub id: i64,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Channel")]
    pub channel_id: i64,
}

impl From<&Channel> for ChannelRow {
    fn from(channel: &Channel) -> Self {
        Self {
            id: channel.id,
            name: channel.name.clone(),
            channel_id: channel.channel_id,
        }
    }
}

/// Render channels as a rounded table, empty string for no rows
pub fn channel_table(channels: &[Channel]) -> String {
    if channels.is_empty() {
        return String::new();
    }

    let rows: Vec<ChannelRow> = channels.iter().map(ChannelRow::from).collect();
    Table::new(&rows).with(Style::rounded()).to_string()
}
