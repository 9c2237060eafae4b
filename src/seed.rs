//! Demo data and chart generators.
//!
//! The demo chats and dashboards are what a fresh install shows before the
//! user creates anything. `random_chart_data` fills widgets created without
//! explicit data.

use rand::Rng;
use rand::seq::IndexedRandom;
use uuid::Uuid;

use crate::model::{Chat, ChartData, Dashboard, Dataset, Message, NewWidget, Rgb, Role, Thread, Widget, WidgetKind};

/// Colors new random charts pick from.
pub const PALETTE: [Rgb; 7] = [
    Rgb::new(0, 122, 255),
    Rgb::new(52, 199, 89),
    Rgb::new(255, 149, 0),
    Rgb::new(255, 59, 48),
    Rgb::new(175, 82, 222),
    Rgb::new(90, 200, 250),
    Rgb::new(255, 204, 0),
];

const MONTHS: [&str; 6] = ["Jan", "Feb", "Mar", "Apr", "May", "Jun"];
const RANDOM_POINTS: usize = 6;
const DEFAULT_STROKE_WIDTH: f64 = 2.0;

// 2023-05-15T00:00:00Z and friends, in epoch millis.
const MAY_15_2023: i64 = 1_684_108_800_000;
const MAY_16_2023: i64 = 1_684_195_200_000;
const MINUTE_MS: i64 = 60_000;
const HOUR_MS: i64 = 60 * MINUTE_MS;

// =============================================================================
// CHART DATA
// =============================================================================

fn series(labels: &[&str], values: &[f64], color: Rgb) -> ChartData {
    ChartData {
        labels: labels.iter().map(|l| (*l).to_string()).collect(),
        datasets: vec![Dataset { data: values.to_vec(), color: Some(color), stroke_width: Some(DEFAULT_STROKE_WIDTH) }],
    }
}

/// Six random integer values in 1..=100 in one palette color. Pie charts are
/// labelled `Item 1..6`, other kinds `Jan..Jun`.
#[must_use]
pub fn random_chart_data(kind: WidgetKind) -> ChartData {
    let mut rng = rand::rng();
    let values: Vec<f64> = (0..RANDOM_POINTS)
        .map(|_| f64::from(rng.random_range(1..=100_u8)))
        .collect();
    let color = PALETTE.choose(&mut rng).copied().unwrap_or(PALETTE[0]);

    let labels: Vec<String> = match kind {
        WidgetKind::PieChart => (1..=RANDOM_POINTS).map(|i| format!("Item {i}")).collect(),
        WidgetKind::LineChart | WidgetKind::BarChart => MONTHS.iter().map(|m| (*m).to_string()).collect(),
    };

    ChartData {
        labels,
        datasets: vec![Dataset { data: values, color: Some(color), stroke_width: Some(DEFAULT_STROKE_WIDTH) }],
    }
}

/// Quick-create templates, one per chart kind.
#[must_use]
pub fn widget_templates() -> Vec<NewWidget> {
    vec![
        NewWidget { kind: WidgetKind::LineChart, title: "Line Chart".into(), data: monthly_active_users() },
        NewWidget { kind: WidgetKind::BarChart, title: "Bar Chart".into(), data: weekly_engagement() },
        NewWidget { kind: WidgetKind::PieChart, title: "Pie Chart".into(), data: framework_usage() },
    ]
}

fn monthly_active_users() -> ChartData {
    series(&MONTHS, &[65.0, 78.0, 52.0, 94.0, 87.0, 72.0], Rgb::new(0, 122, 255))
}

fn weekly_engagement() -> ChartData {
    series(
        &["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"],
        &[20.0, 45.0, 28.0, 80.0, 99.0, 43.0, 65.0],
        Rgb::new(52, 199, 89),
    )
}

fn framework_usage() -> ChartData {
    series(
        &["React", "Vue", "Angular", "Svelte", "Other"],
        &[45.0, 25.0, 15.0, 10.0, 5.0],
        Rgb::new(255, 149, 0),
    )
}

// =============================================================================
// DEMO CHATS
// =============================================================================

fn message(role: Role, content: &str, timestamp: i64) -> Message {
    Message { id: Uuid::new_v4(), content: content.to_string(), role, timestamp }
}

fn thread(title: &str, created_at: i64, messages: Vec<Message>) -> Thread {
    Thread { id: Uuid::new_v4(), title: title.to_string(), messages, created_at }
}

/// One expanded chat with two answered threads.
#[must_use]
pub fn demo_chats() -> Vec<Chat> {
    let ideas_at = MAY_15_2023 + 10 * HOUR_MS + 30 * MINUTE_MS;
    let ideas = thread(
        "Product Ideas Discussion",
        MAY_15_2023,
        vec![
            message(Role::User, "What are some innovative product ideas for our platform?", ideas_at),
            message(
                Role::Assistant,
                "Based on current market trends, I would suggest exploring:\n\n1. **AI-powered analytics** for user behavior\n2. **Customizable dashboards** with drag-and-drop functionality\n3. **Integration capabilities** with popular third-party tools\n\nWould you like me to elaborate on any of these ideas?",
                ideas_at + 2 * MINUTE_MS,
            ),
        ],
    );

    let implementation_at = MAY_16_2023 + 14 * HOUR_MS + 20 * MINUTE_MS;
    let implementation = thread(
        "Technical Implementation",
        MAY_16_2023,
        vec![
            message(Role::User, "How should we implement the AI features?", implementation_at),
            message(
                Role::Assistant,
                "For AI implementation, I recommend:\n\n- Using TensorFlow.js for browser-based ML\n- Implementing a RESTful API for server-side processing\n- Considering cloud-based AI services for scalability",
                implementation_at + 2 * MINUTE_MS,
            ),
        ],
    );

    vec![Chat {
        id: Uuid::new_v4(),
        title: "Product Development".into(),
        threads: vec![ideas, implementation],
        created_at: MAY_15_2023,
        is_expanded: true,
    }]
}

// =============================================================================
// DEMO DASHBOARDS
// =============================================================================

fn widget(kind: WidgetKind, title: &str, data: ChartData) -> Widget {
    Widget { id: Uuid::new_v4(), kind, title: title.to_string(), data }
}

fn dashboard(title: &str, created_at: i64, widgets: Vec<Widget>) -> Dashboard {
    Dashboard { id: Uuid::new_v4(), title: title.to_string(), widgets, created_at }
}

/// Three populated dashboards and one empty one.
#[must_use]
pub fn demo_dashboards() -> Vec<Dashboard> {
    const JUN_10_2023: i64 = 1_686_355_200_000;
    const JUL_20_2023: i64 = 1_689_811_200_000;
    const AUG_01_2023: i64 = 1_690_848_000_000;

    vec![
        dashboard(
            "Product Analytics",
            MAY_15_2023,
            vec![
                widget(WidgetKind::LineChart, "Monthly Active Users", monthly_active_users()),
                widget(WidgetKind::BarChart, "Weekly Engagement", weekly_engagement()),
                widget(WidgetKind::PieChart, "Framework Usage", framework_usage()),
            ],
        ),
        dashboard(
            "Financial Overview",
            JUN_10_2023,
            vec![
                widget(
                    WidgetKind::LineChart,
                    "Quarterly Revenue",
                    series(&["Q1", "Q2", "Q3", "Q4"], &[125_000.0, 145_000.0, 165_000.0, 195_000.0], Rgb::new(175, 82, 222)),
                ),
                widget(
                    WidgetKind::BarChart,
                    "Expense Breakdown",
                    series(
                        &["R&D", "Marketing", "Operations", "Salaries", "Other"],
                        &[45_000.0, 30_000.0, 25_000.0, 60_000.0, 15_000.0],
                        Rgb::new(255, 59, 48),
                    ),
                ),
            ],
        ),
        dashboard(
            "Marketing Performance",
            JUL_20_2023,
            vec![
                widget(
                    WidgetKind::LineChart,
                    "User Growth",
                    series(
                        &["2019", "2020", "2021", "2022", "2023"],
                        &[1000.0, 2500.0, 5000.0, 12_000.0, 25_000.0],
                        Rgb::new(255, 59, 48),
                    ),
                ),
                widget(
                    WidgetKind::LineChart,
                    "Conversion Rates",
                    series(&MONTHS, &[2.5, 3.2, 2.8, 4.1, 3.9, 4.5], Rgb::new(90, 200, 250)),
                ),
                widget(
                    WidgetKind::BarChart,
                    "Campaign Performance",
                    series(
                        &["Email", "Social", "Search", "Referral", "Direct"],
                        &[1200.0, 850.0, 1500.0, 600.0, 400.0],
                        Rgb::new(52, 199, 89),
                    ),
                ),
                widget(
                    WidgetKind::PieChart,
                    "Traffic Sources",
                    series(
                        &["Organic", "Paid", "Social", "Email", "Direct"],
                        &[40.0, 25.0, 20.0, 10.0, 5.0],
                        Rgb::new(88, 86, 214),
                    ),
                ),
            ],
        ),
        dashboard("Empty Dashboard", AUG_01_2023, vec![]),
    ]
}

#[cfg(test)]
#[path = "seed_test.rs"]
mod tests;
