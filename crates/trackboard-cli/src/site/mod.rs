//! Static HTML dashboard: one section per domain with inline SVG charts.
//!
//! Charts come from the [`SvgBackend`] slots of a fully built
//! [`Dashboard`], so the page shows exactly what the controller drew.

pub mod svg;

use std::fmt::Write as _;

use trackboard_core::chart::Target;
use trackboard_core::error::Result;
use trackboard_core::session::{Dashboard, DomainSession};
use trackboard_core::table::Column;

pub use svg::SvgBackend;

const STYLE: &str = r"
body{font-family:system-ui,sans-serif;margin:0;background:#f3f4f6;color:#111827}
header{background:#0053e2;color:#fff;padding:16px 24px}
header h1{margin:0;font-size:20px}
header small{opacity:.8}
nav{display:flex;gap:4px;padding:8px 24px;background:#fff;border-bottom:1px solid #e5e7eb}
nav button{border:0;background:none;padding:8px 12px;cursor:pointer;border-bottom:2px solid transparent}
nav button.active{border-color:#0053e2;font-weight:600}
section{display:none;padding:16px 24px}
section.active{display:block}
.cards{display:flex;gap:12px;flex-wrap:wrap;margin-bottom:16px}
.card{background:#fff;border-radius:8px;padding:12px 16px;min-width:140px;box-shadow:0 1px 2px #0001}
.card b{display:block;font-size:22px}
.badges span{display:inline-block;background:#ffc220;border-radius:12px;padding:2px 10px;margin-right:6px;font-size:12px}
.grid{display:grid;grid-template-columns:repeat(auto-fit,minmax(480px,1fr));gap:16px}
.panel{background:#fff;border-radius:8px;padding:12px;overflow-x:auto}
.panel h3{margin:0 0 8px;font-size:14px}
.empty{color:#6b7280;font-style:italic}
table{border-collapse:collapse;width:100%;font-size:12px}
th,td{text-align:left;padding:4px 8px;border-bottom:1px solid #e5e7eb}
th{background:#f9fafb}
";

const SCRIPT: &str = r"
document.querySelectorAll('nav button').forEach(function(b){
  b.addEventListener('click',function(){
    document.querySelectorAll('nav button,section').forEach(function(e){e.classList.remove('active')});
    b.classList.add('active');
    document.getElementById('domain-'+b.dataset.slug).classList.add('active');
  });
});
";

/// Counts reported after a build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SiteStats {
    pub domains: usize,
    pub issues: usize,
    pub epics: usize,
    pub charts: usize,
}

/// Escape text for HTML element and attribute content.
pub fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Render the whole page. Every domain must already be built.
///
/// # Errors
///
/// Returns `UnknownDomain` if the dashboard's tab list and sessions disagree.
pub fn render(dash: &Dashboard<SvgBackend>) -> Result<(String, SiteStats)> {
    let store = dash.store();
    let mut stats = SiteStats {
        domains: dash.slugs().len(),
        issues: store.total_issues(),
        epics: 0,
        charts: dash.charts().len(),
    };

    let mut page = String::with_capacity(64 * 1024);
    page.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"UTF-8\">\n");
    page.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n");
    page.push_str("<title>Trackboard</title>\n<style>");
    page.push_str(STYLE);
    page.push_str("</style>\n</head>\n<body>\n<header><h1>Trackboard</h1>");
    let generated = store
        .generated_at()
        .map_or_else(|| dash.today().to_string(), str::to_string);
    let _ = write!(page, "<small>Data as of {}</small>", escape(&generated));
    page.push_str("</header>\n<nav>");
    for (i, slug) in dash.slugs().iter().enumerate() {
        let name = store.domain(slug).map_or(slug.as_str(), |d| d.name.as_str());
        let _ = write!(
            page,
            r#"<button data-slug="{slug}"{active}>{name}</button>"#,
            slug = escape(slug),
            active = if i == 0 { r#" class="active""# } else { "" },
            name = escape(name),
        );
    }
    page.push_str("</nav>\n");

    for (i, slug) in dash.slugs().iter().enumerate() {
        let session = dash.session(slug)?;
        stats.epics += session.table.len();
        domain_section(&mut page, dash, session, i == 0);
    }

    page.push_str("<script>");
    page.push_str(SCRIPT);
    page.push_str("</script>\n</body>\n</html>\n");
    Ok((page, stats))
}

fn domain_section(page: &mut String, dash: &Dashboard<SvgBackend>, session: &DomainSession, active: bool) {
    let slug = &session.slug;
    let _ = write!(
        page,
        r#"<section id="domain-{slug}"{cls}>"#,
        slug = escape(slug),
        cls = if active { r#" class="active""# } else { "" },
    );

    let issues = dash.store().issues(slug).len();
    let shown = session.aggregate.as_ref().map_or(0, |a| a.issue_count);
    let cycle = session.aggregate.as_ref().map_or(0.0, |a| a.cycle_time.mean);
    let lead = session.aggregate.as_ref().map_or(0.0, |a| a.lead_time.mean);
    page.push_str(r#"<div class="cards">"#);
    for (label, value) in [
        ("Issues", issues.to_string()),
        ("Shown", shown.to_string()),
        ("Avg cycle time", format!("{cycle:.1} d")),
        ("Avg lead time", format!("{lead:.1} d")),
        ("Epics", session.table.len().to_string()),
    ] {
        let _ = write!(page, r#"<div class="card">{label}<b>{value}</b></div>"#);
    }
    page.push_str("</div>");

    let badges = session.filter.badges();
    if !badges.is_empty() {
        page.push_str(r#"<div class="badges">"#);
        for badge in badges {
            let _ = write!(page, "<span>{}</span>", escape(&badge.to_string()));
        }
        page.push_str("</div>");
    }

    page.push_str(r#"<div class="grid">"#);
    for (target, title) in [
        (Target::Service, "Issues by service"),
        (Target::Status, "Issues by status"),
        (Target::CycleTime, "Cycle time (days)"),
        (Target::LeadTime, "Lead time (days)"),
    ] {
        chart_panel(page, dash, &target.id(slug), title);
    }
    page.push_str("</div>");
    chart_panel(page, dash, &Target::Gantt.id(slug), "Epic timeline");
    epic_table(page, session);
    page.push_str("</section>\n");
}

fn chart_panel(page: &mut String, dash: &Dashboard<SvgBackend>, id: &str, title: &str) {
    let _ = write!(page, r#"<div class="panel" id="{id}"><h3>{title}</h3>"#);
    match dash.charts().backend().get(id) {
        Some(svg) => page.push_str(svg),
        None => page.push_str(r#"<p class="empty">No data for the current filters.</p>"#),
    }
    page.push_str("</div>");
}

fn epic_table(page: &mut String, session: &DomainSession) {
    let rows = session.table.visible();
    let _ = write!(
        page,
        r#"<div class="panel"><h3>Epics ({} of {})</h3><table id="{}"><thead><tr>"#,
        rows.len(),
        session.table.len(),
        Target::EpicTable.id(&escape(&session.slug)),
    );
    for column in Column::ALL {
        let _ = write!(page, "<th>{}</th>", column.header());
    }
    page.push_str("</tr></thead><tbody>");
    for row in rows {
        page.push_str("<tr>");
        for column in Column::ALL {
            let _ = write!(page, "<td>{}</td>", escape(column.cell(row)));
        }
        page.push_str("</tr>");
    }
    page.push_str("</tbody></table></div>");
}
