//! Interactive dashboard view over a [`Dashboard`] controller.
//!
//! The view owns no chart data: every frame reads the specs the controller
//! left in its [`RetainedBackend`] slots, so what is drawn always matches the
//! last aggregate.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Axis, Block, Borders, Cell, Chart, Clear, Dataset, GraphType, List, ListItem, ListState,
    Paragraph, Row, Table, TableState, Tabs,
};

use trackboard_core::chart::spec::{BarChart, DoughnutChart};
use trackboard_core::chart::{ChartSpec, ControlChart, RetainedBackend, Target};
use trackboard_core::filter::{FilterField, Week};
use trackboard_core::gantt::{self, GanttLayout, TODAY_LABEL};
use trackboard_core::session::Dashboard;
use trackboard_core::table::{Column, SortDirection};

/// Columns shown in the epic table; the rest stay searchable.
const TABLE_COLUMNS: [Column; 7] = [
    Column::Key,
    Column::Summary,
    Column::Status,
    Column::Assignee,
    Column::Start,
    Column::End,
    Column::Service,
];

const GANTT_LABEL_WIDTH: usize = 28;

/// Panel that receives navigation keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Panel {
    #[default]
    Weeks,
    Services,
    Statuses,
    Gantt,
    Table,
}

impl Panel {
    const ORDER: [Self; 5] = [
        Self::Weeks,
        Self::Services,
        Self::Statuses,
        Self::Gantt,
        Self::Table,
    ];

    const fn title(self) -> &'static str {
        match self {
            Self::Weeks => "Week",
            Self::Services => "Services",
            Self::Statuses => "Statuses",
            Self::Gantt => "Timeline",
            Self::Table => "Epics",
        }
    }

    /// Filter dimension cleared by `x` while this panel has focus.
    const fn field(self) -> FilterField {
        match self {
            Self::Weeks => FilterField::Week,
            Self::Services => FilterField::Service,
            Self::Statuses => FilterField::Status,
            Self::Gantt | Self::Table => FilterField::Epic,
        }
    }

    fn step(self, back: bool) -> Self {
        let n = Self::ORDER.len();
        let i = Self::ORDER.iter().position(|p| *p == self).unwrap_or(0);
        let next = if back { (i + n - 1) % n } else { (i + 1) % n };
        Self::ORDER[next]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum InputMode {
    #[default]
    Normal,
    Search,
    Help,
}

pub struct DashboardView {
    dash: Dashboard<RetainedBackend>,
    /// Panel receiving j/k/Enter.
    pub focus: Panel,
    /// Cursor per panel, reset on tab change.
    cursors: [usize; 5],
    input_mode: InputMode,
    /// Search text being typed.
    search_buf: String,
    /// Query before entering search mode (restored on Esc).
    search_prev: String,
    /// Column the next `s` sorts by.
    sort_column: usize,
    should_quit: bool,
    status_msg: Option<String>,
}

impl DashboardView {
    /// Wrap a controller and activate `initial` (or the first tab).
    ///
    /// # Errors
    ///
    /// Returns an error when `initial` is not a known domain.
    pub fn new(mut dash: Dashboard<RetainedBackend>, initial: Option<&str>) -> Result<Self> {
        let slug = initial.map_or_else(|| dash.active().to_string(), str::to_string);
        if !slug.is_empty() {
            dash.switch_tab(&slug)?;
        }
        Ok(Self {
            dash,
            focus: Panel::default(),
            cursors: [0; 5],
            input_mode: InputMode::default(),
            search_buf: String::new(),
            search_prev: String::new(),
            sort_column: 0,
            should_quit: false,
            status_msg: None,
        })
    }

    pub const fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub const fn dashboard(&self) -> &Dashboard<RetainedBackend> {
        &self.dash
    }

    fn slug(&self) -> String {
        self.dash.active().to_string()
    }

    fn cursor(&self) -> usize {
        self.cursors[self.panel_index()]
    }

    fn panel_index(&self) -> usize {
        Panel::ORDER
            .iter()
            .position(|p| *p == self.focus)
            .unwrap_or(0)
    }

    fn spec(&self, target: Target) -> Option<&ChartSpec> {
        self.dash
            .charts()
            .backend()
            .get(&target.id(self.dash.active()))
    }

    // -----------------------------------------------------------------------
    // Panel contents
    // -----------------------------------------------------------------------

    /// Week choices, `all` first.
    fn week_items(&self) -> Vec<String> {
        let mut items = vec![Week::All.to_string()];
        items.extend(self.dash.store().weeks(self.dash.active()));
        items
    }

    fn service_items(&self) -> Vec<(String, f64)> {
        match self.spec(Target::Service) {
            Some(ChartSpec::Bar(BarChart { labels, values, .. })) => {
                labels.iter().cloned().zip(values.iter().copied()).collect()
            }
            _ => Vec::new(),
        }
    }

    fn status_items(&self) -> Vec<(String, f64)> {
        match self.spec(Target::Status) {
            Some(ChartSpec::Doughnut(DoughnutChart { labels, values, .. })) => {
                labels.iter().cloned().zip(values.iter().copied()).collect()
            }
            _ => Vec::new(),
        }
    }

    fn gantt_layout(&self) -> Option<&GanttLayout> {
        match self.spec(Target::Gantt) {
            Some(ChartSpec::Gantt(layout)) => Some(layout),
            _ => None,
        }
    }

    fn table_keys(&self) -> Vec<String> {
        self.dash
            .session(self.dash.active())
            .map(|s| s.table.visible().iter().map(|r| r.key.clone()).collect())
            .unwrap_or_default()
    }

    fn item_count(&self, panel: Panel) -> usize {
        match panel {
            Panel::Weeks => self.week_items().len(),
            Panel::Services => self.service_items().len(),
            Panel::Statuses => self.status_items().len(),
            Panel::Gantt => self.gantt_layout().map_or(0, |l| l.bars.len()),
            Panel::Table => self.table_keys().len(),
        }
    }

    fn clamp_cursors(&mut self) {
        for (i, panel) in Panel::ORDER.into_iter().enumerate() {
            let n = self.item_count(panel);
            self.cursors[i] = self.cursors[i].min(n.saturating_sub(1));
        }
    }

    // -----------------------------------------------------------------------
    // Key event handling
    // -----------------------------------------------------------------------

    /// Apply one key press.
    ///
    /// # Errors
    ///
    /// Returns an error if the controller rejects the active domain.
    pub fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match self.input_mode {
            InputMode::Search => self.handle_search_key(key)?,
            InputMode::Help => {
                if matches!(key.code, KeyCode::Esc | KeyCode::Char('?' | 'q')) {
                    self.input_mode = InputMode::Normal;
                }
            }
            InputMode::Normal => self.handle_normal_key(key, ctrl)?,
        }
        self.clamp_cursors();
        Ok(())
    }

    fn handle_normal_key(&mut self, key: KeyEvent, ctrl: bool) -> Result<()> {
        let slug = self.slug();
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('c') if ctrl => self.should_quit = true,
            KeyCode::Char('?') => self.input_mode = InputMode::Help,

            // Domain tabs
            KeyCode::Right | KeyCode::Char('l' | ']') => self.change_tab(false)?,
            KeyCode::Left | KeyCode::Char('h' | '[') => self.change_tab(true)?,

            // Panels
            KeyCode::Tab => self.focus = self.focus.step(false),
            KeyCode::BackTab => self.focus = self.focus.step(true),
            KeyCode::Char('j') | KeyCode::Down => {
                let n = self.item_count(self.focus);
                let i = self.panel_index();
                if self.cursors[i] + 1 < n {
                    self.cursors[i] += 1;
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                let i = self.panel_index();
                self.cursors[i] = self.cursors[i].saturating_sub(1);
            }
            KeyCode::Enter | KeyCode::Char(' ') => self.activate(&slug)?,

            // Timeline status pill
            KeyCode::Char('p') => {
                let session = self.dash.session(&slug)?;
                let next = session.gantt_pill.next(&gantt::statuses(self.dash.store().gantt(&slug)));
                self.status_msg = Some(format!("timeline: {next}"));
                self.dash.set_gantt_filter(&slug, next)?;
            }

            // Table
            KeyCode::Char('/') => {
                self.search_prev = self.dash.session(&slug)?.table.query().to_string();
                self.search_buf = self.search_prev.clone();
                self.input_mode = InputMode::Search;
                self.focus = Panel::Table;
            }
            KeyCode::Char('s') => {
                let column = TABLE_COLUMNS[self.sort_column];
                let direction = self.dash.table_mut(&slug)?.sort_by(column);
                self.status_msg = Some(format!("sorted by {} {}", column.header(), arrow(direction)));
            }
            KeyCode::Char('.') => self.sort_column = (self.sort_column + 1) % TABLE_COLUMNS.len(),
            KeyCode::Char(',') => {
                self.sort_column = (self.sort_column + TABLE_COLUMNS.len() - 1) % TABLE_COLUMNS.len();
            }
            KeyCode::Char('t') => self.toggle_table_filter(&slug)?,

            // Clearing
            KeyCode::Char('x') => {
                let field = self.focus.field();
                self.dash.clear_filter(&slug, field)?;
                self.status_msg = Some(format!("cleared {}", field.label()));
            }
            KeyCode::Char('X') => {
                self.dash.clear_all_filters(&slug)?;
                self.status_msg = Some("cleared all filters".to_string());
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_search_key(&mut self, key: KeyEvent) -> Result<()> {
        let slug = self.slug();
        match key.code {
            KeyCode::Esc => {
                self.search_buf = self.search_prev.clone();
                self.input_mode = InputMode::Normal;
            }
            KeyCode::Enter => self.input_mode = InputMode::Normal,
            KeyCode::Backspace => {
                self.search_buf.pop();
            }
            KeyCode::Char(c) => self.search_buf.push(c),
            _ => return Ok(()),
        }
        self.dash.table_mut(&slug)?.set_query(&self.search_buf);
        Ok(())
    }

    fn change_tab(&mut self, back: bool) -> Result<()> {
        self.dash.cycle_tab(back)?;
        self.cursors = [0; 5];
        self.status_msg = None;
        Ok(())
    }

    /// Enter on the focused panel: select a week or toggle a cross-filter.
    fn activate(&mut self, slug: &str) -> Result<()> {
        let cursor = self.cursor();
        match self.focus {
            Panel::Weeks => {
                let Some(week) = self.week_items().get(cursor).cloned() else {
                    return Ok(());
                };
                let current = self.dash.session(slug)?.filter.week.clone();
                let next = if current.as_str() == week { Week::All } else { Week::from(week) };
                self.dash.set_week(slug, next)?;
            }
            Panel::Services => {
                if let Some((service, _)) = self.service_items().get(cursor).cloned() {
                    self.dash.toggle_service(slug, &service)?;
                }
            }
            Panel::Statuses => {
                if let Some((status, _)) = self.status_items().get(cursor).cloned() {
                    self.dash.toggle_status(slug, &status)?;
                }
            }
            Panel::Gantt => {
                let key = self
                    .gantt_layout()
                    .and_then(|l| l.bars.get(cursor))
                    .map(|b| b.key.clone());
                if let Some(key) = key {
                    self.dash.toggle_epic(slug, &key)?;
                }
            }
            Panel::Table => {
                if let Some(key) = self.table_keys().get(cursor).cloned() {
                    self.dash.toggle_epic(slug, &key)?;
                }
            }
        }
        Ok(())
    }

    /// `t` on the service or status panel filters the epic table by that value.
    fn toggle_table_filter(&mut self, slug: &str) -> Result<()> {
        let cursor = self.cursor();
        let (column, items) = match self.focus {
            Panel::Services => (Column::Service, self.service_items()),
            Panel::Statuses => (Column::Status, self.status_items()),
            _ => return Ok(()),
        };
        if let Some((value, _)) = items.get(cursor) {
            let on = self.dash.table_mut(slug)?.toggle_chart_filter(column, value);
            self.status_msg = Some(if on {
                format!("epics: {} ~ {value}", column.header())
            } else {
                "epics: chart filter cleared".to_string()
            });
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Rendering
    // -----------------------------------------------------------------------

    pub fn render(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(10),
                Constraint::Length(1),
            ])
            .split(area);

        self.render_tabs(frame, rows[0]);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(34), Constraint::Min(40)])
            .split(rows[1]);
        let side = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Percentage(30),
                Constraint::Percentage(35),
                Constraint::Percentage(35),
            ])
            .split(body[0]);
        let main = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Percentage(30),
                Constraint::Percentage(35),
                Constraint::Percentage(35),
            ])
            .split(body[1]);
        let charts = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(main[0]);

        self.render_weeks(frame, side[0]);
        self.render_counts(frame, side[1], Panel::Services, &self.service_items());
        self.render_counts(frame, side[2], Panel::Statuses, &self.status_items());
        self.render_control(frame, charts[0], Target::CycleTime, "Cycle time (d)");
        self.render_control(frame, charts[1], Target::LeadTime, "Lead time (d)");
        self.render_gantt(frame, main[1]);
        self.render_table(frame, main[2]);
        self.render_status(frame, rows[2]);

        if self.input_mode == InputMode::Help {
            render_help(frame, area);
        }
    }

    fn block(&self, panel: Panel, title: String) -> Block<'static> {
        let style = if self.focus == panel {
            Style::default().fg(Color::Green)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        Block::default()
            .borders(Borders::ALL)
            .border_style(style)
            .title(Span::styled(
                title,
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            ))
    }

    fn render_tabs(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let store = self.dash.store();
        let titles: Vec<Line<'_>> = self
            .dash
            .slugs()
            .iter()
            .map(|slug| {
                let name = store.domain(slug).map_or(slug.as_str(), |d| d.name.as_str());
                Line::from(name.to_string())
            })
            .collect();
        let selected = self
            .dash
            .slugs()
            .iter()
            .position(|s| s == self.dash.active())
            .unwrap_or(0);
        let tabs = Tabs::new(titles)
            .select(selected)
            .block(Block::default().borders(Borders::ALL).title(" trackboard "))
            .highlight_style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            );
        frame.render_widget(tabs, area);
    }

    fn render_weeks(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let active_week = self
            .dash
            .session(self.dash.active())
            .map(|s| s.filter.week.to_string())
            .unwrap_or_default();
        let items: Vec<ListItem<'_>> = self
            .week_items()
            .into_iter()
            .map(|week| {
                let marker = if week == active_week { "● " } else { "  " };
                ListItem::new(format!("{marker}{week}"))
            })
            .collect();
        self.render_list(frame, area, Panel::Weeks, items, Panel::Weeks.title().to_string());
    }

    fn render_counts(
        &self,
        frame: &mut ratatui::Frame<'_>,
        area: Rect,
        panel: Panel,
        items: &[(String, f64)],
    ) {
        let active = self.dash.session(self.dash.active()).ok().and_then(|s| {
            s.filter.value(panel.field()).map(str::to_string)
        });
        let width = usize::from(area.width.saturating_sub(4));
        let list: Vec<ListItem<'_>> = items
            .iter()
            .map(|(label, value)| {
                let marker = if active.as_deref() == Some(label) { "● " } else { "  " };
                let count = format!("{value:.0}");
                let room = width.saturating_sub(count.len() + 3);
                let name: String = label.chars().take(room).collect();
                ListItem::new(format!("{marker}{name:<room$} {count}"))
            })
            .collect();
        let title = if items.is_empty() {
            format!("{} (no data)", panel.title())
        } else {
            panel.title().to_string()
        };
        self.render_list(frame, area, panel, list, title);
    }

    fn render_list(
        &self,
        frame: &mut ratatui::Frame<'_>,
        area: Rect,
        panel: Panel,
        items: Vec<ListItem<'_>>,
        title: String,
    ) {
        let list = List::new(items)
            .block(self.block(panel, format!(" {title} ")))
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
        let mut state = ListState::default();
        if self.focus == panel {
            state.select(Some(self.cursor()));
        }
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn render_control(&self, frame: &mut ratatui::Frame<'_>, area: Rect, target: Target, title: &str) {
        let block = Block::default().borders(Borders::ALL).title(format!(" {title} "));
        let Some(ChartSpec::Control(chart)) = self.spec(target) else {
            frame.render_widget(
                Paragraph::new("no data").style(Style::default().fg(Color::DarkGray)).block(block),
                area,
            );
            return;
        };
        let series = ControlPoints::from(chart);
        let n = series.len_f64();
        let max = chart.max_value().max(1.0) * 1.1;

        let mut datasets = vec![
            Dataset::default()
                .name("values")
                .marker(Marker::Braille)
                .graph_type(GraphType::Scatter)
                .style(Style::default().fg(hex_color(chart.bars.first().map_or("", |b| b.color.as_str()))))
                .data(&series.normal),
            Dataset::default()
                .name("> UCL")
                .marker(Marker::Braille)
                .graph_type(GraphType::Scatter)
                .style(Style::default().fg(Color::Red))
                .data(&series.alarm),
        ];
        for (line, points) in chart.lines.iter().zip(&series.lines) {
            datasets.push(
                Dataset::default()
                    .name(line.name.to_uppercase())
                    .graph_type(GraphType::Line)
                    .style(Style::default().fg(hex_color(line.color)))
                    .data(points),
            );
        }
        let widget = Chart::new(datasets)
            .block(block)
            .x_axis(Axis::default().bounds([0.0, n]))
            .y_axis(
                Axis::default()
                    .bounds([0.0, max])
                    .labels(vec![
                        Span::from("0"),
                        Span::from(format!("{:.0}", max / 2.0)),
                        Span::from(format!("{max:.0}")),
                    ]),
            );
        frame.render_widget(widget, area);
    }

    fn render_gantt(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let pill = self
            .dash
            .session(self.dash.active())
            .map(|s| s.gantt_pill.to_string())
            .unwrap_or_default();
        let Some(layout) = self.gantt_layout() else {
            let block = self.block(Panel::Gantt, format!(" Timeline [{pill}] "));
            frame.render_widget(
                Paragraph::new("no epics with dates").style(Style::default().fg(Color::DarkGray)).block(block),
                area,
            );
            return;
        };

        let title = match layout.today {
            Some(today) => format!(
                " Timeline [{pill}] {} .. {}  {TODAY_LABEL} {today} ",
                layout.window_start, layout.window_end
            ),
            None => format!(" Timeline [{pill}] {} .. {} ", layout.window_start, layout.window_end),
        };
        let track = usize::from(area.width.saturating_sub(4)).saturating_sub(GANTT_LABEL_WIDTH + 1);
        let today_cell = layout.today.map(|d| cell(layout.fraction(d), track));
        let selected = (self.focus == Panel::Gantt).then(|| self.cursor());

        let lines: Vec<Line<'_>> = layout
            .bars
            .iter()
            .enumerate()
            .map(|(i, bar)| {
                let from = cell(layout.fraction(bar.start), track);
                let to = cell(layout.fraction(bar.end), track).max(from + 1);
                let label: String = bar.label.chars().take(GANTT_LABEL_WIDTH).collect();
                let label_style = if selected == Some(i) {
                    Style::default().add_modifier(Modifier::REVERSED)
                } else {
                    Style::default()
                };
                let mut spans = vec![Span::styled(format!("{label:<GANTT_LABEL_WIDTH$} "), label_style)];
                let bar_color = hex_color(bar.color.hex());
                for c in 0..track {
                    let span = if (from..to).contains(&c) {
                        Span::styled("█", Style::default().fg(bar_color))
                    } else if today_cell == Some(c) {
                        Span::styled("┊", Style::default().fg(Color::Red))
                    } else {
                        Span::raw(" ")
                    };
                    spans.push(span);
                }
                Line::from(spans)
            })
            .collect();

        let scroll = selected
            .unwrap_or(0)
            .saturating_sub(usize::from(area.height.saturating_sub(3)));
        let paragraph = Paragraph::new(lines)
            .block(self.block(Panel::Gantt, title))
            .scroll((u16::try_from(scroll).unwrap_or(u16::MAX), 0));
        frame.render_widget(paragraph, area);
    }

    fn render_table(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let Ok(session) = self.dash.session(self.dash.active()) else {
            return;
        };
        let table = &session.table;
        let visible = table.visible();

        let header = Row::new(TABLE_COLUMNS.iter().enumerate().map(|(i, c)| {
            let mut text = c.header().to_string();
            if let Some((_, direction)) = table.sort().filter(|(sorted, _)| sorted == c) {
                text.push_str(arrow(direction));
            }
            let style = if i == self.sort_column {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().add_modifier(Modifier::BOLD)
            };
            Cell::from(text).style(style)
        }));
        let rows = visible.iter().map(|row| {
            Row::new(TABLE_COLUMNS.iter().map(|c| Cell::from(c.cell(row).to_string())))
        });

        let mut title = format!(" Epics {} of {} ", visible.len(), table.len());
        if self.input_mode == InputMode::Search {
            title.push_str(&format!("/{}_ ", self.search_buf));
        } else if !table.query().is_empty() {
            title.push_str(&format!("/{} ", table.query()));
        } else if let Some(filter) = table.chart_filter() {
            title.push_str(&format!("[{} ~ {}] ", filter.column.header(), filter.value));
        }

        let widget = Table::new(
            rows,
            [
                Constraint::Length(10),
                Constraint::Min(20),
                Constraint::Length(16),
                Constraint::Length(16),
                Constraint::Length(10),
                Constraint::Length(10),
                Constraint::Length(16),
            ],
        )
        .header(header)
        .block(self.block(Panel::Table, title))
        .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED));
        let mut state = TableState::default();
        if self.focus == Panel::Table {
            state.select(Some(self.cursor()));
        }
        frame.render_stateful_widget(widget, area, &mut state);
    }

    fn render_status(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let badges = self.dash.badges(self.dash.active()).unwrap_or_default();
        let mut spans: Vec<Span<'_>> = Vec::new();
        if badges.is_empty() {
            spans.push(Span::styled("no filters", Style::default().fg(Color::DarkGray)));
        }
        for badge in badges {
            spans.push(Span::styled(
                format!(" {badge} "),
                Style::default().fg(Color::Black).bg(Color::Yellow),
            ));
            spans.push(Span::raw(" "));
        }
        if let Some(msg) = &self.status_msg {
            spans.push(Span::styled(format!("  {msg}"), Style::default().fg(Color::Cyan)));
        }
        spans.push(Span::styled(
            "  ? help  q quit",
            Style::default().fg(Color::DarkGray),
        ));
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}

/// Control-chart points split into drawable datasets.
struct ControlPoints {
    normal: Vec<(f64, f64)>,
    alarm: Vec<(f64, f64)>,
    lines: Vec<Vec<(f64, f64)>>,
}

impl ControlPoints {
    fn len_f64(&self) -> f64 {
        self.lines
            .first()
            .and_then(|l| l.last())
            .map_or(1.0, |(x, _)| *x)
    }
}

impl From<&ControlChart> for ControlPoints {
    #[allow(clippy::cast_precision_loss)]
    fn from(chart: &ControlChart) -> Self {
        let ucl = chart.lines[1].value;
        let mut normal = Vec::new();
        let mut alarm = Vec::new();
        for (i, bar) in chart.bars.iter().enumerate() {
            let point = (i as f64 + 0.5, bar.y);
            if bar.y > ucl {
                alarm.push(point);
            } else {
                normal.push(point);
            }
        }
        let end = (chart.bars.len() as f64).max(1.0);
        let lines = chart
            .lines
            .iter()
            .map(|l| vec![(0.0, l.value), (end, l.value)])
            .collect();
        Self { normal, alarm, lines }
    }
}

fn render_help(frame: &mut ratatui::Frame<'_>, area: Rect) {
    let width = area.width.min(60);
    let height = area.height.min(20);
    let popup = Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    };
    let text = [
        "h/l  ←/→     previous / next domain",
        "Tab          next panel",
        "j/k  ↑/↓     move in panel",
        "Enter        toggle filter (week, service, status, epic)",
        "p            cycle timeline status",
        "/            search epics (Esc restores)",
        "s            sort epics by highlighted column",
        ", .          choose sort column",
        "t            filter epics by service/status",
        "x            clear the focused panel's filter",
        "X            clear all filters",
        "q            quit",
    ];
    let lines: Vec<Line<'_>> = text.iter().map(|l| Line::from(*l)).collect();
    frame.render_widget(Clear, popup);
    frame.render_widget(
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(" keys ")),
        popup,
    );
}

const fn arrow(direction: SortDirection) -> &'static str {
    match direction {
        SortDirection::Ascending => " ▲",
        SortDirection::Descending => " ▼",
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn cell(fraction: f64, width: usize) -> usize {
    if width == 0 {
        return 0;
    }
    let max = width - 1;
    ((fraction.clamp(0.0, 1.0) * max as f64).round() as usize).min(max)
}

/// `#rrggbb` (optionally with alpha) to a terminal colour.
fn hex_color(hex: &str) -> Color {
    let digits = hex.trim_start_matches('#');
    let channel = |i: usize| {
        digits
            .get(i..i + 2)
            .and_then(|s| u8::from_str_radix(s, 16).ok())
    };
    match (channel(0), channel(2), channel(4)) {
        (Some(r), Some(g), Some(b)) => Color::Rgb(r, g, b),
        _ => Color::Gray,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use trackboard_core::config::ProjectConfig;
    use trackboard_core::store::{Dataset, IssueStore};

    const DATA: &str = r#"{
        "domains": [{"slug": "general", "name": "General"}, {"slug": "pagos", "name": "Pagos"}],
        "issues": {
            "general": [
                {"key": "A-1", "service": "API", "status": "Done", "created": "2026-01-01", "week": "2026-W01", "epic_key": "E-1", "cycle_time": 2.0, "lead_time": 5.0},
                {"key": "A-2", "service": "API", "status": "Open", "created": "2026-01-02", "week": "2026-W02", "epic_key": "E-2", "cycle_time": 4.0, "lead_time": 6.0},
                {"key": "A-3", "service": "Web", "status": "Done", "created": "2026-01-03", "week": "2026-W02", "epic_key": "E-1", "cycle_time": 30.0, "lead_time": 40.0}
            ],
            "pagos": [
                {"key": "P-1", "service": "Wallet", "status": "Open", "created": "2026-01-04", "week": "2026-W02"}
            ]
        },
        "gantt": {
            "general": [
                {"key": "E-1", "summary": "Checkout", "start": "2026-01-01", "end": "2026-01-20", "status": "In Progress"},
                {"key": "E-2", "summary": "Wallet", "start": "2026-01-05", "end": "2026-02-01", "status": "Blocked", "color": "blocked"}
            ],
            "pagos": []
        }
    }"#;

    fn view() -> DashboardView {
        let today = NaiveDate::from_ymd_opt(2026, 1, 10).expect("date");
        let cfg = ProjectConfig::default();
        let store = IssueStore::from_dataset(Dataset::from_json(DATA).expect("parse"), &cfg, today);
        let dash = Dashboard::new(store, cfg, today, RetainedBackend::new());
        DashboardView::new(dash, None).expect("view")
    }

    fn press(view: &mut DashboardView, code: KeyCode) {
        view.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
            .expect("key");
    }

    fn filter_of(view: &DashboardView) -> trackboard_core::filter::Filter {
        view.dashboard()
            .session("general")
            .expect("session")
            .filter
            .clone()
    }

    #[test]
    fn q_quits() {
        let mut v = view();
        press(&mut v, KeyCode::Char('q'));
        assert!(v.should_quit());
    }

    #[test]
    fn enter_on_service_toggles_cross_filter() {
        let mut v = view();
        press(&mut v, KeyCode::Tab);
        assert_eq!(v.focus, Panel::Services);
        press(&mut v, KeyCode::Enter);
        assert_eq!(filter_of(&v).service.as_deref(), Some("API"));
        let agg = v.dashboard().session("general").expect("s").aggregate.clone().expect("agg");
        assert_eq!(agg.issue_count, 2);
        press(&mut v, KeyCode::Enter);
        assert_eq!(filter_of(&v).service, None);
    }

    #[test]
    fn week_selection_and_clear() {
        let mut v = view();
        press(&mut v, KeyCode::Down);
        press(&mut v, KeyCode::Enter);
        assert_eq!(filter_of(&v).week, Week::from("2026-W02"));
        press(&mut v, KeyCode::Char('x'));
        assert!(filter_of(&v).week.is_all());
    }

    #[test]
    fn gantt_enter_toggles_epic_and_pill_cycles() {
        let mut v = view();
        v.focus = Panel::Gantt;
        press(&mut v, KeyCode::Enter);
        assert_eq!(filter_of(&v).epic_key.as_deref(), Some("E-1"));
        press(&mut v, KeyCode::Char('X'));
        assert!(filter_of(&v).is_empty());

        press(&mut v, KeyCode::Char('p'));
        let pill = v.dashboard().session("general").expect("s").gantt_pill.to_string();
        assert_eq!(pill, "In Progress");
        assert_eq!(v.gantt_layout().map(|l| l.bars.len()), Some(1));
    }

    #[test]
    fn search_filters_table_and_esc_restores() {
        let mut v = view();
        press(&mut v, KeyCode::Char('/'));
        for c in "wallet".chars() {
            press(&mut v, KeyCode::Char(c));
        }
        assert_eq!(v.table_keys(), vec!["E-2"]);
        press(&mut v, KeyCode::Esc);
        assert_eq!(v.table_keys().len(), 2);
    }

    #[test]
    fn tabs_switch_domains_lazily() {
        let mut v = view();
        assert!(!v.dashboard().session("pagos").expect("s").built);
        press(&mut v, KeyCode::Right);
        assert_eq!(v.dashboard().active(), "pagos");
        assert!(v.dashboard().session("pagos").expect("s").built);
        press(&mut v, KeyCode::Left);
        assert_eq!(v.dashboard().active(), "general");
    }

    #[test]
    fn renders_without_panicking() {
        let v = view();
        let mut terminal = Terminal::new(TestBackend::new(140, 48)).expect("terminal");
        terminal
            .draw(|frame| v.render(frame, frame.area()))
            .expect("draw");
        let text: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(text.contains("General"));
        assert!(text.contains("Services"));
        assert!(text.contains("Epics 2 of 2"));
    }

    #[test]
    fn hex_colors_parse_with_alpha() {
        assert_eq!(hex_color("#0053e2"), Color::Rgb(0, 0x53, 0xe2));
        assert_eq!(hex_color("#6366f199"), Color::Rgb(0x63, 0x66, 0xf1));
        assert_eq!(hex_color("nope"), Color::Gray);
    }
}
