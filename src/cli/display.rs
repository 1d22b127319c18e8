use crate::models::Contact;
use crate::service::{FailedRecord, ImportSummary, Page};

const TABLE_HEADERS: [&str; 6] = ["#", "First Name", "Last Name", "Phone", "Email", "Address"];

/// Print one contact, skipping empty optional fields
pub fn print_contact(contact: &Contact) {
    println!("{}. {}", contact.id, contact.full_name());
    println!("  {}", contact.phone);
    if let Some(ref email) = contact.email {
        println!("  {}", email);
    }
    if let Some(ref address) = contact.address {
        println!("  {}", address);
    }
}

/// One line per contact: `1. Jane Doe, Phone: (555)123-4567`
pub fn contact_line(contact: &Contact) -> String {
    format!("{}. {}, Phone: {}", contact.id, contact.full_name(), contact.phone)
}

fn table_row(contact: &Contact) -> [String; 6] {
    [
        contact.id.to_string(),
        contact.first_name.clone(),
        contact.last_name.clone(),
        contact.phone.to_string(),
        contact.email.clone().unwrap_or_default(),
        contact.address.clone().unwrap_or_default(),
    ]
}

/// Render contacts as a bordered grid with a header row.
pub fn contacts_table(contacts: &[Contact]) -> String {
    let rows: Vec<[String; 6]> = contacts.iter().map(table_row).collect();

    let mut widths = TABLE_HEADERS.map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let rule = |fill: char| {
        let mut line = String::from("+");
        for width in widths {
            line.extend(std::iter::repeat(fill).take(width + 2));
            line.push('+');
        }
        line
    };
    let cells = |values: &[&str]| {
        let mut line = String::from("|");
        for (value, width) in values.iter().zip(widths) {
            let pad = width - value.chars().count();
            line.push_str(&format!(" {}{} |", value, " ".repeat(pad)));
        }
        line
    };

    let mut out = vec![rule('-'), cells(&TABLE_HEADERS), rule('=')];
    for row in &rows {
        let values: Vec<&str> = row.iter().map(String::as_str).collect();
        out.push(cells(&values));
        out.push(rule('-'));
    }
    out.join("\n")
}

pub fn print_page(page: &Page) {
    println!("{}", contacts_table(&page.contacts));
    println!(
        "\nShowing page {} of {} ({} contact{})",
        page.number,
        page.page_count(),
        page.total,
        if page.total == 1 { "" } else { "s" }
    );
}

/// `Last name: 'Doe' -> 'Smith'` lines for every changed field
pub fn format_changes(before: &Contact, after: &Contact) -> Vec<String> {
    before
        .changes_to(after)
        .into_iter()
        .map(|(field, old, new)| format!("{}: '{}' -> '{}'", capitalize(field), old, new))
        .collect()
}

pub fn print_changes(before: &Contact, after: &Contact) {
    let changes = format_changes(before, after);
    if changes.is_empty() {
        println!("No changes.");
        return;
    }
    for line in changes {
        println!("  {}", line);
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Startup overview: total count and the first few contacts
pub fn print_summary(total: u32, first: &[Contact]) {
    println!("Total contacts: {}", total);
    if total == 0 {
        println!("No contacts found in the phone book.");
        return;
    }
    for contact in first {
        println!("  {}", contact_line(contact));
    }
}

fn failed_line(failed: &FailedRecord) -> String {
    if failed.record.is_empty() {
        format!("line {}: {}", failed.line, failed.reason)
    } else {
        format!("line {}: {} - {}", failed.line, failed.record, failed.reason)
    }
}

pub fn print_import_summary(summary: &ImportSummary) {
    println!(
        "Imported {} contact(s), {} record(s) failed.",
        summary.success_count,
        summary.failed_count()
    );

    if !summary.imported.is_empty() {
        println!("\nAdded:");
        for contact in &summary.imported {
            println!("  {}, Phone: {}", contact.full_name(), contact.phone);
        }
    }

    if !summary.failed.is_empty() {
        println!("\nFailed:");
        for failed in &summary.failed {
            println!("  {}", failed_line(failed));
        }
    }
}
