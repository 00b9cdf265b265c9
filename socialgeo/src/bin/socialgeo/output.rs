use anyhow::Result;
use clap::ValueEnum;
use colored::Colorize;
use comfy_table::{Attribute, Cell, CellAlignment, Color as TableColor, Table, presets};
use serde::Serialize;

use socialgeo::TourReport;
use socialgeo::output::theme::{ICONS, THEME};

/// Output format options for CLI commands
#[derive(Clone, Debug, ValueEnum, Default, PartialEq)]
pub enum OutputFormat {
    /// Formatted table output (default)
    #[default]
    Table,
    /// JSON output for scripting
    Json,
    /// Compact single-line output
    Compact,
}

/// Global CLI options that affect output and behavior
#[derive(Clone, Debug, Default)]
pub struct GlobalOptions {
    pub output_format: OutputFormat,
    pub quiet: bool,
    #[allow(dead_code)]
    pub verbose: bool,
    pub no_color: bool,
}

/// Trait for data that can be displayed as a table
pub trait TableDisplay {
    fn to_table(&self, options: &GlobalOptions) -> Table;
    fn to_compact(&self) -> String;
}

/// Output manager handles formatting and display
pub struct OutputManager {
    pub options: GlobalOptions,
}

impl OutputManager {
    pub fn new(options: GlobalOptions) -> Self {
        Self { options }
    }

    /// Display data according to the configured output format
    pub fn display<T>(&self, data: &T) -> Result<()>
    where
        T: Serialize + TableDisplay,
    {
        if self.options.quiet {
            return Ok(());
        }

        match self.options.output_format {
            OutputFormat::Json => self.display_json(data)?,
            OutputFormat::Table => {
                let table = data.to_table(&self.options);
                println!("\n{table}");
            }
            OutputFormat::Compact => {
                println!("{}", data.to_compact());
            }
        }
        Ok(())
    }

    pub fn display_json<T: Serialize>(&self, data: &T) -> Result<()> {
        if self.options.quiet {
            return Ok(());
        }
        let json = serde_json::to_string_pretty(data)?;
        println!("{json}");
        Ok(())
    }

    /// Print text as is
    pub fn raw(&self, text: &str) {
        if !self.options.quiet {
            println!("{text}");
        }
    }

    /// Display an error message with color and icon
    pub fn error(&self, message: &str) {
        let output = if self.options.no_color {
            format!("{} {message}", ICONS.error)
        } else {
            format!("{} {}", ICONS.error.color(THEME.error), message.color(THEME.error))
        };
        eprintln!("{output}");
    }
}

impl TableDisplay for TourReport {
    fn to_table(&self, options: &GlobalOptions) -> Table {
        let mut table = Table::new();
        let header = ["#", "Person", "Email", "Distance (km)"].map(|title| Cell::new(title).add_attribute(Attribute::Bold));
        if options.no_color {
            table.load_preset(presets::ASCII_FULL).set_header(header);
        } else {
            table
                .load_preset(presets::UTF8_FULL_CONDENSED)
                .set_header(header.map(|cell| cell.fg(TableColor::Cyan)));
        }

        if self.nearby.is_empty() {
            table.add_row(vec![Cell::new("-"), Cell::new("No persons within range")]);
            return table;
        }

        for (rank, entry) in self.nearby.iter().enumerate() {
            table.add_row(vec![
                Cell::new(rank + 1),
                Cell::new(entry.person.full_name()),
                Cell::new(&entry.person.email),
                Cell::new(format!("{:.1}", entry.distance_m / 1000.0)).set_alignment(CellAlignment::Right),
            ]);
        }

        table
    }

    fn to_compact(&self) -> String {
        let ranking = self
            .nearby
            .iter()
            .map(|entry| format!("{}@{:.1}km", entry.person.full_name(), entry.distance_m / 1000.0))
            .collect::<Vec<_>>()
            .join(",");
        format!(
            "persons={} friendship={}->{} post_likes={} friend_posts={} live_events={} nearby=[{ranking}]",
            self.persons.len(),
            self.friendship.from,
            self.friendship.to,
            self.post.likes,
            self.feed.as_ref().map_or(0, |feed| feed.friend_posts.len()),
            self.live.events.len(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use socialgeo::{Friendship, GeoPoint, LiveSummary, NearbyPerson, Person, Post, RecordId};

    fn report() -> TourReport {
        let author = RecordId::new("persons", "a");
        let friend = RecordId::new("persons", "b");
        let mut near = Person::new("Tilonon", "Tilonon", "marie@example.com", GeoPoint::new(2.3522, 48.8566));
        near.id = Some(friend.clone());
        let mut far = Person::new("Emmanuel", "Manou", "emmanuel@example.com", GeoPoint::new(-0.11, 22.0));
        far.id = Some(author.clone());
        let mut post = Post::new(author.clone(), "hello");
        post.likes = 1;

        TourReport {
            persons: vec![far.clone(), near.clone()],
            friendship: Friendship {
                id: RecordId::new("friends", "f"),
                from: author,
                to: friend,
                created_at: Utc::now(),
            },
            post,
            feed: None,
            nearby: vec![
                NearbyPerson { person: near, distance_m: 0.0 },
                NearbyPerson { person: far, distance_m: 2_990_000.0 },
            ],
            live: LiveSummary::default(),
        }
    }

    #[test]
    fn compact_lists_the_ranking_in_order() {
        let line = report().to_compact();
        assert!(line.starts_with("persons=2 friendship=persons:a->persons:b post_likes=1"));
        assert!(line.ends_with("nearby=[Tilonon Tilonon@0.0km,Emmanuel Manou@2990.0km]"));
    }

    #[test]
    fn table_has_one_row_per_ranked_person() {
        let options = GlobalOptions {
            no_color: true,
            ..Default::default()
        };
        let rendered = report().to_table(&options).to_string();
        assert!(rendered.contains("Distance (km)"));
        assert!(rendered.contains("Tilonon Tilonon"));
        assert!(rendered.contains("2990.0"));
    }

    #[test]
    fn quiet_display_prints_nothing_and_succeeds() {
        let manager = OutputManager::new(GlobalOptions {
            quiet: true,
            output_format: OutputFormat::Json,
            ..Default::default()
        });
        assert!(manager.display(&report()).is_ok());
    }
}
