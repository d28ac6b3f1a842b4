//! Event management commands for CLI.

use chrono::{Datelike, Local, NaiveDate, NaiveTime};
use clap::{Args, Subcommand, ValueEnum};
use eventide_core::event::{format_time, parse_date, parse_time};
use eventide_core::{
    sort_for_display, Color, Config, Database, DateRange, EventFormData, EventInstance, EventStore,
    RecurrencePattern, RecurrenceType,
};

#[derive(Clone, Copy, ValueEnum)]
pub enum Repeat {
    Daily,
    Weekly,
    Monthly,
}

impl From<Repeat> for RecurrenceType {
    fn from(value: Repeat) -> Self {
        match value {
            Repeat::Daily => RecurrenceType::Daily,
            Repeat::Weekly => RecurrenceType::Weekly,
            Repeat::Monthly => RecurrenceType::Monthly,
        }
    }
}

/// Field flags shared by `add` and `update`.
#[derive(Args)]
pub struct EventFields {
    /// Last day of a multi-day event (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    end_date: Option<NaiveDate>,
    /// Start time (HH:MM)
    #[arg(long, value_parser = parse_time)]
    start_time: Option<NaiveTime>,
    /// End time (HH:MM)
    #[arg(long, value_parser = parse_time)]
    end_time: Option<NaiveTime>,
    /// Drop start and end times
    #[arg(long, conflicts_with_all = ["start_time", "end_time"])]
    all_day: bool,
    /// Event description
    #[arg(long)]
    description: Option<String>,
    /// Display color (#rgb or #rrggbb)
    #[arg(long)]
    color: Option<Color>,
    /// Category label
    #[arg(long)]
    category: Option<String>,
    /// Repeat the event
    #[arg(long, value_enum)]
    repeat: Option<Repeat>,
    /// Interval between occurrences, in units of --repeat
    #[arg(long)]
    every: Option<u32>,
    /// Last date of the series (YYYY-MM-DD, inclusive)
    #[arg(long, value_parser = parse_date)]
    until: Option<NaiveDate>,
    /// Number of occurrences
    #[arg(long)]
    count: Option<u32>,
}

impl EventFields {
    fn touches_recurrence(&self) -> bool {
        self.repeat.is_some() || self.every.is_some() || self.until.is_some() || self.count.is_some()
    }

    /// Apply the given flags to `form`; unset flags keep the form's values.
    fn apply(self, form: &mut EventFormData, config: &Config) {
        if self.touches_recurrence() {
            let current = form.effective_recurrence().cloned();
            let kind = self
                .repeat
                .map(RecurrenceType::from)
                .or_else(|| current.as_ref().map(|p| p.kind.clone()))
                .unwrap_or_else(|| config.defaults.recurrence_type.clone());
            let frequency = self
                .every
                .or_else(|| current.as_ref().map(|p| p.frequency))
                .unwrap_or(1);
            let mut pattern = RecurrencePattern::new(kind, frequency);
            pattern.days_of_week = current.as_ref().and_then(|p| p.days_of_week.clone());
            pattern.end_date = self.until.or_else(|| current.as_ref().and_then(|p| p.end_date));
            pattern.end_after_occurrences = self
                .count
                .or_else(|| current.as_ref().and_then(|p| p.end_after_occurrences));
            form.is_recurring = true;
            form.recurrence = Some(pattern);
        }
        if let Some(end_date) = self.end_date {
            form.end_date = end_date;
        }
        if self.all_day {
            form.start_time = None;
            form.end_time = None;
        }
        if let Some(start_time) = self.start_time {
            form.start_time = Some(start_time);
        }
        if let Some(end_time) = self.end_time {
            form.end_time = Some(end_time);
        }
        if let Some(description) = self.description {
            form.description = Some(description);
        }
        if let Some(color) = self.color {
            form.color = color;
        }
        if let Some(category) = self.category {
            form.category = Some(category);
        }
    }
}

#[derive(Subcommand)]
pub enum EventAction {
    /// Create a new event
    Add {
        /// Event title
        title: String,
        /// Date of the (first) occurrence (YYYY-MM-DD, default: today)
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
        #[command(flatten)]
        fields: EventFields,
    },
    /// List event occurrences (default: the current month)
    List {
        /// First day (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date, requires = "to", conflicts_with_all = ["month", "on"])]
        from: Option<NaiveDate>,
        /// Last day (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date, requires = "from")]
        to: Option<NaiveDate>,
        /// Calendar month (YYYY-MM)
        #[arg(long, value_parser = parse_month, conflicts_with = "on")]
        month: Option<(i32, u32)>,
        /// Widen --month to whole weeks, as a month grid shows it
        #[arg(long)]
        grid: bool,
        /// A single day (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        on: Option<NaiveDate>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show an event definition
    Show {
        /// Event ID
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Update an event, or a single occurrence with --instance
    Update {
        /// Event ID
        id: String,
        /// Occurrence date to edit instead of the whole series
        #[arg(long, value_parser = parse_date)]
        instance: Option<NaiveDate>,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// New start date
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
        /// Stop repeating
        #[arg(long, conflicts_with_all = ["repeat", "every", "until", "count"])]
        no_repeat: bool,
        #[command(flatten)]
        fields: EventFields,
    },
    /// Delete an event, or a single occurrence with --instance
    Delete {
        /// Event ID
        id: String,
        /// Occurrence date to delete instead of the whole series
        #[arg(long, value_parser = parse_date)]
        instance: Option<NaiveDate>,
    },
    /// Move an event to another date
    Move {
        /// Event ID
        id: String,
        /// New date (YYYY-MM-DD)
        #[arg(value_parser = parse_date)]
        date: NaiveDate,
    },
}

fn parse_month(value: &str) -> Result<(i32, u32), String> {
    let invalid = || format!("invalid month '{value}': expected YYYY-MM");
    let (year, month) = value.trim().split_once('-').ok_or_else(invalid)?;
    let year = year.parse::<i32>().map_err(|_| invalid())?;
    let month = month.parse::<u32>().map_err(|_| invalid())?;
    if !(1..=12).contains(&month) {
        return Err(invalid());
    }
    Ok((year, month))
}

/// End date of a `start..=end` span moved to begin on `new_start`.
fn shifted_end(start: NaiveDate, end: NaiveDate, new_start: NaiveDate) -> Result<NaiveDate, String> {
    new_start
        .checked_add_signed(end - start)
        .ok_or_else(|| format!("moving the event to {new_start} puts its end out of range"))
}

fn format_instance(instance: &EventInstance) -> String {
    let when = match (instance.start_time, instance.end_time) {
        (Some(start), Some(end)) => format!("{}-{}", format_time(&start), format_time(&end)),
        (Some(start), None) => format_time(&start),
        _ => "all day".to_string(),
    };
    let mut line = format!("{}  {:<11}  {}", instance.start_date, when, instance.title);
    if instance.end_date != instance.start_date {
        line.push_str(&format!(" (until {})", instance.end_date));
    }
    if let Some(category) = &instance.category {
        line.push_str(&format!(" [{category}]"));
    }
    if instance.is_recurring {
        line.push_str(" (recurring)");
    }
    line.push_str(&format!("  {}", instance.id));
    line
}

pub fn run(action: EventAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let db = Database::open(&config)?;
    let mut store = EventStore::with_config(db, &config)?;
    tracing::debug!(events = store.definitions().len(), "store opened");

    match action {
        EventAction::Add { title, date, fields } => {
            let date = date.unwrap_or_else(|| Local::now().date_naive());
            let mut form = EventFormData::with_defaults(title, date, &config.defaults);
            fields.apply(&mut form, &config);
            if form.end_date < form.start_date {
                return Err("end date is before start date".into());
            }
            let id = store.add(form)?;
            println!("Event created: {id}");
        }
        EventAction::List {
            from,
            to,
            month,
            grid,
            on,
            json,
        } => {
            let range = match (from, to, month, on) {
                (Some(from), Some(to), _, _) => DateRange::new(from, to)?,
                (_, _, _, Some(day)) => DateRange::day(day),
                (_, _, Some((year, month)), _) if grid => DateRange::month_grid(year, month)?,
                (_, _, Some((year, month)), _) => DateRange::month(year, month)?,
                _ => {
                    let today = Local::now().date_naive();
                    DateRange::month(today.year(), today.month())?
                }
            };

            let mut instances: Vec<_> = store.list_in_range(range)?.collect();
            sort_for_display(&mut instances);

            if json {
                println!("{}", serde_json::to_string_pretty(&instances)?);
            } else if instances.is_empty() {
                println!("No events found between {} and {}.", range.start(), range.end());
            } else {
                for instance in &instances {
                    println!("{}", format_instance(instance));
                }
            }
        }
        EventAction::Show { id, json } => {
            let definition = store
                .get(&id)
                .ok_or_else(|| format!("Event not found: {id}"))?;
            if json {
                println!("{}", serde_json::to_string_pretty(definition)?);
            } else {
                println!("{}  {}", definition.id, definition.title);
                println!("  dates:  {} .. {}", definition.start_date, definition.end_date);
                if let Some(start) = definition.start_time {
                    println!("  start:  {}", format_time(&start));
                }
                if let Some(end) = definition.end_time {
                    println!("  end:    {}", format_time(&end));
                }
                println!("  color:  {}", definition.color);
                if let Some(category) = &definition.category {
                    println!("  category: {category}");
                }
                if let Some(description) = &definition.description {
                    println!("  description: {description}");
                }
                if let Some(pattern) = &definition.recurrence {
                    let mut rule = format!("{} (every {})", pattern.kind, pattern.frequency);
                    if let Some(until) = pattern.end_date {
                        rule.push_str(&format!(", until {until}"));
                    }
                    if let Some(count) = pattern.end_after_occurrences {
                        rule.push_str(&format!(", {count} times"));
                    }
                    println!("  repeats: {rule}");
                }
                if !definition.recurrence_exceptions.is_empty() {
                    let skipped: Vec<_> = definition
                        .recurrence_exceptions
                        .iter()
                        .map(|d| d.to_string())
                        .collect();
                    println!("  skipped: {}", skipped.join(", "));
                }
                if !definition.recurrence_modifications.is_empty() {
                    let edited: Vec<_> = definition
                        .recurrence_modifications
                        .keys()
                        .map(|d| d.to_string())
                        .collect();
                    println!("  edited:  {}", edited.join(", "));
                }
            }
        }
        EventAction::Update {
            id,
            instance,
            title,
            date,
            no_repeat,
            fields,
        } => {
            let definition = store
                .get(&id)
                .ok_or_else(|| format!("Event not found: {id}"))?;
            let mut form = definition.to_form();
            if let Some(existing) = instance.and_then(|d| definition.recurrence_modifications.get(&d)) {
                if let Some(title) = &existing.title {
                    form.title = title.clone();
                }
                if let Some(description) = &existing.description {
                    form.description = description.clone();
                }
                if let Some(start_time) = existing.start_time {
                    form.start_time = start_time;
                }
                if let Some(end_time) = existing.end_time {
                    form.end_time = end_time;
                }
                if let Some(color) = &existing.color {
                    form.color = color.clone();
                }
                if let Some(category) = &existing.category {
                    form.category = category.clone();
                }
            }

            if let Some(title) = title {
                form.title = title;
            }
            if let Some(date) = date {
                form.end_date = shifted_end(form.start_date, form.end_date, date)?;
                form.start_date = date;
            }
            if no_repeat {
                form.is_recurring = false;
                form.recurrence = None;
            }
            fields.apply(&mut form, &config);
            if form.end_date < form.start_date {
                return Err("end date is before start date".into());
            }

            store.update(&id, form, instance)?;
            match instance {
                Some(date) => println!("Event updated: {id} ({date})"),
                None => println!("Event updated: {id}"),
            }
        }
        EventAction::Delete { id, instance } => {
            store.remove(&id, instance)?;
            match instance {
                Some(date) => println!("Event deleted: {id} ({date})"),
                None => println!("Event deleted: {id}"),
            }
        }
        EventAction::Move { id, date } => {
            let outcome = store.reschedule(&id, date)?;
            match outcome.message() {
                Some(message) => eprintln!("warning: {message}"),
                None => println!("Event moved to {date}"),
            }
        }
    }
    Ok(())
}
