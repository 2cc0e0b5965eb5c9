//! HTML pages.

use maud::{DOCTYPE, Markup, PreEscaped, html};

use crate::{
    fetcher::ChapterText,
    progress::{DayViewState, ProgressRecord},
    schedule::{DAYS_IN_PLAN, Day, ScheduleEntry},
};

const CSS: &str = r#"
body { font-family: Georgia, serif; max-width: 52rem; margin: 2rem auto; padding: 0 1rem; color: #222; }
a { color: #2a5db0; }
.today-card { border: 1px solid #ccc; border-radius: 6px; padding: 1rem; margin-bottom: 1.5rem; }
.board { display: grid; grid-template-columns: repeat(15, 1fr); gap: 4px; }
.board a { display: block; text-align: center; padding: 4px 0; font-size: 0.8rem; border-radius: 3px; text-decoration: none; }
.board .completed { background: #4caf50; color: #fff; }
.board .today { background: #ffc107; color: #222; font-weight: bold; }
.board .locked { background: #eee; color: #999; }
.chapter-text { white-space: pre-wrap; line-height: 1.6; }
nav { margin: 1rem 0; display: flex; gap: 1rem; }
"#;

fn layout(title: &str, body: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                style { (PreEscaped(CSS)) }
            }
            body { (body) }
        }
    }
}

fn day_class(view: &DayViewState) -> &'static str {
    if view.is_completed {
        "completed"
    } else if view.is_today {
        "today"
    } else {
        "locked"
    }
}

fn mark_done_form(day: Day) -> Markup {
    html! {
        form action={ "/mark_done/" (day.to_string()) } method="post" {
            button type="submit" { "Mark as Done" }
        }
    }
}

/// Board of all days with the next reading on top.
pub fn overview(progress: &ProgressRecord, today: Option<(Day, &ScheduleEntry)>) -> Markup {
    let body = html! {
        h1 { "Bible Reading Plan" }
        h2 { "Your Progress: " (format!("{:.2}", progress.percentage())) "% completed" }
        p { (progress.last_completed_day) " of " (DAYS_IN_PLAN) " days done" }
        @match today {
            Some((day, entry)) => {
                div.today-card {
                    h3 { "Today's Reading: Day " (day.to_string()) }
                    p { "Book: " (entry.book) }
                    p { "Chapter: " (entry.chapter.to_string()) }
                    p { a href={ "/day/" (day.to_string()) } { "Read it" } }
                    (mark_done_form(day))
                }
            }
            None => {
                div.today-card { h3 { "You have finished the plan!" } }
            }
        }
        div.board {
            @for view in progress.day_views() {
                a class=(day_class(&view)) href={ "/day/" (view.day.to_string()) } title={ "Day " (view.day.to_string()) } {
                    @if view.is_completed { "✓" } @else { (view.day.to_string()) }
                }
            }
        }
    };
    layout("Bible Reading Plan", body)
}

/// A single day's reading.
pub fn day_detail(view: &DayViewState, entry: &ScheduleEntry, text: &ChapterText) -> Markup {
    let day = view.day;
    let body = html! {
        nav {
            a href="/" { "All days" }
            @if let Some(prev) = day.prev() {
                a href={ "/day/" (prev.to_string()) } { "← Day " (prev.to_string()) }
            }
            @if let Some(next) = day.next() {
                a href={ "/day/" (next.to_string()) } { "Day " (next.to_string()) " →" }
            }
        }
        h1 { "Day " (day.to_string()) ": " (entry.book) " " (entry.chapter.to_string()) }
        @if let Some(media) = &entry.media {
            p { a href=(media) target="_blank" rel="noopener" { "Watch the video for today" } }
        }
        div.chapter-text { (text.as_str()) }
        @if view.is_completed {
            p { "✓ Completed" }
        } @else if view.is_today {
            (mark_done_form(day))
        } @else {
            p { "Finish the earlier days first." }
        }
    };
    layout(&format!("Day {day}"), body)
}
