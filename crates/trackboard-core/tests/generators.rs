use proptest::prelude::*;
use trackboard_core::filter::{Filter, FilterField, Week};
use trackboard_core::model::Issue;

pub const SERVICES: [&str; 4] = ["API", "Web", "Batch", ""];
pub const STATUSES: [&str; 3] = ["Open", "In Progress", "Done"];
pub const WEEKS: [&str; 3] = ["2026-W01", "2026-W02", "2026-W03"];
pub const EPICS: [&str; 3] = ["E-1", "E-2", ""];

fn pick(values: &'static [&'static str]) -> impl Strategy<Value = String> + Clone {
    prop::sample::select(values).prop_map(str::to_string)
}

fn arb_metric() -> impl Strategy<Value = Option<f64>> + Clone {
    prop::option::of(0.0f64..120.0)
}

pub fn arb_issue() -> impl Strategy<Value = Issue> + Clone {
    (
        0u32..10_000,
        pick(&SERVICES),
        pick(&STATUSES),
        1u32..=28,
        pick(&WEEKS),
        pick(&EPICS),
        arb_metric(),
        arb_metric(),
    )
        .prop_map(|(n, service, status, day, week, epic_key, cycle_time, lead_time)| {
            let created = format!("2026-01-{day:02}");
            Issue {
                service,
                status,
                updated: created.clone(),
                created,
                week,
                epic_key,
                cycle_time,
                lead_time,
                ..Issue::new(format!("K-{n}"))
            }
        })
}

pub fn arb_issues() -> impl Strategy<Value = Vec<Issue>> + Clone {
    prop::collection::vec(arb_issue(), 0..60)
}

pub fn arb_field() -> impl Strategy<Value = FilterField> + Clone {
    prop::sample::select(FilterField::ALL.to_vec())
}

pub fn arb_value_for(field: FilterField) -> BoxedStrategy<String> {
    match field {
        FilterField::Week => pick(&WEEKS).boxed(),
        FilterField::Epic => pick(&["E-1", "E-2"]).boxed(),
        FilterField::Service => pick(&["API", "Web", "Batch"]).boxed(),
        FilterField::Status => pick(&STATUSES).boxed(),
    }
}

pub fn arb_filter() -> impl Strategy<Value = Filter> + Clone {
    (
        prop::option::of(pick(&WEEKS)),
        prop::option::of(pick(&["E-1", "E-2"])),
        prop::option::of(pick(&["API", "Web", "Batch"])),
        prop::option::of(pick(&STATUSES)),
    )
        .prop_map(|(week, epic_key, service, status)| Filter {
            week: week.map_or(Week::All, Week::Named),
            epic_key,
            service,
            status,
        })
}
