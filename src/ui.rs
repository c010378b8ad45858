use anyhow::Result;
use aqi_dashboard::analytics::{self, CityRanking, Heatmap};
use aqi_dashboard::{
    classify, estimate, predict_with_category, AirQualityRecord, AqiCategory, HealthProfile,
    ImpactResult, MitigationAction, ModelPort, Pollutant, PollutantReadings, Prediction,
    RecommendationTable,
};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{BarChart, Block, Borders, Cell, Paragraph, Row, Sparkline, Table, TableState, Wrap},
    Frame, Terminal,
};
use std::io;

const TREE_STEP: u32 = 5_000;
const CAR_STEP: u32 = 500;
const FALLBACK_BASELINE: f64 = 100.0;
const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    CityAqi,
    Predict,
    Compare,
    Heatmap,
    TopCities,
    WhatIf,
}

impl Page {
    pub const ALL: [Page; 6] = [
        Page::CityAqi,
        Page::Predict,
        Page::Compare,
        Page::Heatmap,
        Page::TopCities,
        Page::WhatIf,
    ];

    pub fn next(&self) -> Self {
        match self {
            Page::CityAqi => Page::Predict,
            Page::Predict => Page::Compare,
            Page::Compare => Page::Heatmap,
            Page::Heatmap => Page::TopCities,
            Page::TopCities => Page::WhatIf,
            Page::WhatIf => Page::CityAqi,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::CityAqi => Page::WhatIf,
            Page::Predict => Page::CityAqi,
            Page::Compare => Page::Predict,
            Page::Heatmap => Page::Compare,
            Page::TopCities => Page::Heatmap,
            Page::WhatIf => Page::TopCities,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::CityAqi => "City AQI",
            Page::Predict => "Predict AQI",
            Page::Compare => "Compare Cities",
            Page::Heatmap => "Heatmap",
            Page::TopCities => "Top 10 Polluted",
            Page::WhatIf => "What If",
        }
    }
}

pub struct App {
    pub records: Vec<AirQualityRecord>,
    pub cities: Vec<String>,
    pub model: Option<Box<dyn ModelPort>>,
    pub recommendations: RecommendationTable,
    pub current_page: Page,
    pub city_state: TableState,
    pub compare_index: usize,
    pub readings: PollutantReadings,
    pub selected_field: usize,
    pub profiles: Vec<HealthProfile>,
    pub mitigation: MitigationAction,
    pub heatmap: Heatmap,
    pub top: Vec<CityRanking>,
}

impl App {
    pub fn new(
        records: Vec<AirQualityRecord>,
        model: Option<Box<dyn ModelPort>>,
        recommendations: RecommendationTable,
    ) -> Self {
        let cities = analytics::cities(&records);

        let mut city_state = TableState::default();
        if !cities.is_empty() {
            city_state.select(Some(0));
        }

        let heatmap = analytics::monthly_heatmap(&records);
        let top = analytics::top_polluted(&records, analytics::DEFAULT_TOP_LIMIT);
        let compare_index = if cities.len() > 1 { 1 } else { 0 };

        Self {
            records,
            cities,
            model,
            recommendations,
            current_page: Page::CityAqi,
            city_state,
            compare_index,
            readings: PollutantReadings::default(),
            selected_field: 0,
            profiles: Vec::new(),
            mitigation: MitigationAction::PlantTrees {
                count: *aqi_dashboard::impact::TREE_COUNT_RANGE.start(),
            },
            heatmap,
            top,
        }
    }

    pub fn next_page(&mut self) {
        self.current_page = self.current_page.next();
    }

    pub fn previous_page(&mut self) {
        self.current_page = self.current_page.previous();
    }

    pub fn selected_city(&self) -> Option<&str> {
        self.city_state
            .selected()
            .and_then(|i| self.cities.get(i))
            .map(String::as_str)
    }

    pub fn compare_city(&self) -> Option<&str> {
        self.cities.get(self.compare_index).map(String::as_str)
    }

    pub fn next_city(&mut self) {
        let len = self.cities.len();
        if len == 0 {
            return;
        }
        let i = match self.city_state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.city_state.select(Some(i));
    }

    pub fn previous_city(&mut self) {
        let len = self.cities.len();
        if len == 0 {
            return;
        }
        let i = match self.city_state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.city_state.select(Some(i));
    }

    pub fn cycle_compare_city(&mut self, forward: bool) {
        let len = self.cities.len();
        if len == 0 {
            return;
        }
        self.compare_index = if forward {
            (self.compare_index + 1) % len
        } else {
            (self.compare_index + len - 1) % len
        };
    }

    pub fn selected_pollutant(&self) -> Pollutant {
        Pollutant::ALL[self.selected_field]
    }

    pub fn next_field(&mut self) {
        self.selected_field = (self.selected_field + 1) % Pollutant::ALL.len();
    }

    pub fn previous_field(&mut self) {
        let len = Pollutant::ALL.len();
        self.selected_field = (self.selected_field + len - 1) % len;
    }

    /// Move the selected reading by `steps` form increments, within the
    /// form's bounds.
    pub fn adjust_reading(&mut self, steps: f64) {
        let pollutant = self.selected_pollutant();
        let (min, max, _) = pollutant.input_bounds();
        let value = self.readings.get(pollutant) + steps * pollutant.input_step();
        // Round away float drift from repeated 0.1 steps.
        let value = (value * 10.0).round() / 10.0;
        self.readings.set(pollutant, value.clamp(min, max));
    }

    /// Select or deselect a profile; selection order is kept.
    pub fn toggle_profile(&mut self, profile: HealthProfile) {
        if let Some(pos) = self.profiles.iter().position(|p| *p == profile) {
            self.profiles.remove(pos);
        } else {
            self.profiles.push(profile);
        }
    }

    pub fn prediction(&self) -> Option<Prediction> {
        self.model
            .as_deref()
            .map(|model| predict_with_category(model, &self.readings))
    }

    /// Baseline for the what-if page: the current prediction, else the
    /// selected city's mean AQI.
    pub fn baseline_aqi(&self) -> f64 {
        if let Some(prediction) = self.prediction() {
            return prediction.aqi;
        }
        self.selected_city()
            .and_then(|city| analytics::summary(&self.records, city))
            .map(|s| s.mean)
            .unwrap_or(FALLBACK_BASELINE)
    }

    pub fn toggle_mitigation(&mut self) {
        self.mitigation = match self.mitigation {
            MitigationAction::PlantTrees { .. } => MitigationAction::RemoveCars {
                count: *aqi_dashboard::impact::CAR_COUNT_RANGE.start(),
            },
            MitigationAction::RemoveCars { .. } => MitigationAction::PlantTrees {
                count: *aqi_dashboard::impact::TREE_COUNT_RANGE.start(),
            },
        };
    }

    /// Step the mitigation count up or down, clamped to the slider range.
    pub fn adjust_mitigation(&mut self, up: bool) {
        let range = self.mitigation.ui_range();
        let step = match self.mitigation {
            MitigationAction::PlantTrees { .. } => TREE_STEP,
            MitigationAction::RemoveCars { .. } => CAR_STEP,
        };
        let count = self.mitigation.count();
        let next = if up {
            count.saturating_add(step).min(*range.end())
        } else {
            count.saturating_sub(step).max(*range.start())
        };

        self.mitigation = match self.mitigation {
            MitigationAction::PlantTrees { .. } => MitigationAction::PlantTrees { count: next },
            MitigationAction::RemoveCars { .. } => MitigationAction::RemoveCars { count: next },
        };
    }

    pub fn impact(&self) -> ImpactResult {
        estimate(self.mitigation, self.baseline_aqi())
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
            KeyCode::BackTab => app.previous_page(),
            KeyCode::Tab => {
                if key.modifiers.contains(KeyModifiers::SHIFT) {
                    app.previous_page();
                } else {
                    app.next_page();
                }
            }
            _ => handle_page_key(app, key.code),
        }
    }
}

fn handle_page_key(app: &mut App, code: KeyCode) {
    match app.current_page {
        Page::CityAqi | Page::Heatmap | Page::TopCities => match code {
            KeyCode::Down | KeyCode::Char('j') => app.next_city(),
            KeyCode::Up | KeyCode::Char('k') => app.previous_city(),
            _ => {}
        },
        Page::Compare => match code {
            KeyCode::Down | KeyCode::Char('j') => app.next_city(),
            KeyCode::Up | KeyCode::Char('k') => app.previous_city(),
            KeyCode::Right | KeyCode::Char('l') => app.cycle_compare_city(true),
            KeyCode::Left | KeyCode::Char('h') => app.cycle_compare_city(false),
            _ => {}
        },
        Page::Predict => match code {
            KeyCode::Down | KeyCode::Char('j') => app.next_field(),
            KeyCode::Up | KeyCode::Char('k') => app.previous_field(),
            KeyCode::Right | KeyCode::Char('l') => app.adjust_reading(1.0),
            KeyCode::Left | KeyCode::Char('h') => app.adjust_reading(-1.0),
            KeyCode::PageUp => app.adjust_reading(10.0),
            KeyCode::PageDown => app.adjust_reading(-10.0),
            KeyCode::Char(c @ '1'..='6') => {
                let index = c as usize - '1' as usize;
                app.toggle_profile(HealthProfile::ALL[index]);
            }
            _ => {}
        },
        Page::WhatIf => match code {
            KeyCode::Char('t') => app.toggle_mitigation(),
            KeyCode::Right | KeyCode::Char('l') | KeyCode::Up => app.adjust_mitigation(true),
            KeyCode::Left | KeyCode::Char('h') | KeyCode::Down => app.adjust_mitigation(false),
            _ => {}
        },
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    match app.current_page {
        Page::CityAqi => render_city_aqi(f, chunks[1], app),
        Page::Predict => render_predict(f, chunks[1], app),
        Page::Compare => render_compare(f, chunks[1], app),
        Page::Heatmap => render_heatmap(f, chunks[1], app),
        Page::TopCities => render_top_cities(f, chunks[1], app),
        Page::WhatIf => render_what_if(f, chunks[1], app),
    }

    render_status_bar(f, chunks[2], app);
}

fn category_color(category: AqiCategory) -> Color {
    let (r, g, b) = category.color_rgb();
    Color::Rgb(r, g, b)
}

fn category_span(aqi: f64) -> Span<'static> {
    let category = classify(aqi);
    Span::styled(
        format!(" {} ", category.label()),
        Style::default()
            .fg(Color::Black)
            .bg(category_color(category))
            .add_modifier(Modifier::BOLD),
    )
}

fn label(text: &str) -> Span<'static> {
    Span::styled(
        text.to_string(),
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    )
}

fn bordered(title: &str) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White))
        .title(format!(" {} ", title))
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let mut tab_spans = vec![];
    for (i, page) in Page::ALL.iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }

        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        tab_spans.push(Span::styled(page.title().to_string(), style));
    }

    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Cities: {}", app.cities.len()),
        Style::default().fg(Color::White),
    ));
    tab_spans.push(Span::raw("  "));
    tab_spans.push(Span::styled(
        format!("Records: {}", app.records.len()),
        Style::default().fg(Color::White),
    ));

    let header = Paragraph::new(vec![Line::from(tab_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green))
            .title(" 🌿 Air Quality Index Dashboard "),
    );

    f.render_widget(header, area);
}

fn render_city_list(f: &mut Frame, area: Rect, app: &mut App) {
    let rows = app.cities.iter().map(|city| Row::new(vec![Cell::from(city.clone())]));

    let table = Table::new(rows, [Constraint::Min(10)])
        .block(bordered("Cities"))
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.city_state);
}

fn summary_lines(app: &App, city: &str) -> Vec<Line<'static>> {
    match analytics::summary(&app.records, city) {
        Some(s) => vec![
            Line::from(vec![label("Mean AQI: "), Span::raw(format!("{:.2} ", s.mean)), category_span(s.mean)]),
            Line::from(vec![label("Min AQI:  "), Span::raw(format!("{:.2}", s.min))]),
            Line::from(vec![label("Max AQI:  "), Span::raw(format!("{:.2}", s.max))]),
            Line::from(vec![label("Days:     "), Span::raw(s.count.to_string())]),
        ],
        None => vec![Line::from("No data for this city")],
    }
}

fn aqi_sparkline_data(app: &App, city: &str) -> Vec<u64> {
    analytics::aqi_series(&app.records, city)
        .iter()
        .map(|p| p.aqi.max(0.0).round() as u64)
        .collect()
}

fn render_city_aqi(f: &mut Frame, area: Rect, app: &mut App) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(28), Constraint::Min(0)])
        .split(area);

    render_city_list(f, columns[0], app);

    let Some(city) = app.selected_city().map(str::to_string) else {
        f.render_widget(Paragraph::new("No records loaded").block(bordered("City AQI")), columns[1]);
        return;
    };

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6),
            Constraint::Percentage(50),
            Constraint::Min(0),
        ])
        .split(columns[1]);

    let summary = Paragraph::new(summary_lines(app, &city))
        .block(bordered(&format!("AQI Summary Statistics - {}", city)));
    f.render_widget(summary, right[0]);

    let data = aqi_sparkline_data(app, &city);
    let trend = Sparkline::default()
        .block(bordered(&format!("AQI Trend - {} ({} days)", city, data.len())))
        .data(&data)
        .style(Style::default().fg(Color::Yellow));
    f.render_widget(trend, right[1]);

    let shares = analytics::pollutant_contribution(&app.records, &city);
    let labels: Vec<String> = shares.iter().map(|s| s.pollutant.label().to_string()).collect();
    let bars: Vec<(&str, u64)> = labels
        .iter()
        .zip(shares.iter())
        .map(|(l, s)| (l.as_str(), s.percent.round() as u64))
        .collect();

    let contribution = BarChart::default()
        .block(bordered("Pollutant Contribution (%)"))
        .data(&bars)
        .bar_width(7)
        .bar_gap(2)
        .bar_style(Style::default().fg(Color::Cyan))
        .value_style(Style::default().fg(Color::Black).bg(Color::Cyan));
    f.render_widget(contribution, right[2]);
}

fn render_predict(f: &mut Frame, area: Rect, app: &mut App) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(9), Constraint::Min(0)])
        .split(columns[0]);

    let rows = Pollutant::ALL.iter().enumerate().map(|(i, pollutant)| {
        let style = if i == app.selected_field {
            Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        Row::new(vec![
            Cell::from(pollutant.label()),
            Cell::from(format!("{:.1}", app.readings.get(*pollutant))),
            Cell::from(pollutant.unit()),
        ])
        .style(style)
    });

    let header = Row::new(["Pollutant", "Level", "Unit"].iter().map(|h| {
        Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    }));

    let form = Table::new(
        rows,
        [Constraint::Length(12), Constraint::Length(10), Constraint::Length(8)],
    )
    .header(header)
    .block(bordered("Pollutant Levels"));
    f.render_widget(form, left[0]);

    let profile_lines: Vec<Line> = HealthProfile::ALL
        .iter()
        .enumerate()
        .map(|(i, profile)| {
            let selected = app.profiles.contains(profile);
            Line::from(vec![
                Span::styled(format!(" {} ", i + 1), Style::default().fg(Color::Yellow)),
                Span::raw(if selected { "[x] " } else { "[ ] " }),
                Span::raw(profile.label()),
            ])
        })
        .collect();
    f.render_widget(
        Paragraph::new(profile_lines).block(bordered("Health Profiles")),
        left[1],
    );

    let mut lines = Vec::new();
    match app.prediction() {
        Some(prediction) => {
            lines.push(Line::from(vec![
                label("Predicted AQI: "),
                Span::raw(format!("{:.2} ", prediction.aqi)),
                category_span(prediction.aqi),
            ]));
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "AQI Assistant:",
                Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
            )));

            let blocks = app
                .recommendations
                .recommend_for_profiles(prediction.category, &app.profiles);
            for block in blocks {
                lines.push(Line::from(""));
                lines.push(Line::from(Span::styled(
                    format!("{}:", block.profile.label()),
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::UNDERLINED),
                )));
                for text_line in block.text.lines() {
                    lines.push(Line::from(text_line.trim().to_string()));
                }
            }
        }
        None => lines.push(Line::from(Span::styled(
            "Prediction model not loaded",
            Style::default().fg(Color::Red),
        ))),
    }

    let result = Paragraph::new(lines)
        .block(bordered("Prediction"))
        .wrap(Wrap { trim: false });
    f.render_widget(result, columns[1]);
}

fn render_compare(f: &mut Frame, area: Rect, app: &mut App) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let cities = [
        app.selected_city().map(str::to_string),
        app.compare_city().map(str::to_string),
    ];

    for (column, city) in columns.iter().zip(cities.iter()) {
        let Some(city) = city else {
            f.render_widget(Paragraph::new("No city").block(bordered("Compare")), *column);
            continue;
        };

        let parts = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(6), Constraint::Min(0)])
            .split(*column);

        f.render_widget(
            Paragraph::new(summary_lines(app, city)).block(bordered(city)),
            parts[0],
        );

        let data = aqi_sparkline_data(app, city);
        let trend = Sparkline::default()
            .block(bordered(&format!("AQI Trend: {}", city)))
            .data(&data)
            .style(Style::default().fg(Color::Yellow));
        f.render_widget(trend, parts[1]);
    }
}

fn render_heatmap(f: &mut Frame, area: Rect, app: &mut App) {
    let mut header_cells = vec![Cell::from("City").style(
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
    )];
    header_cells.extend(MONTHS.iter().map(|m| {
        Cell::from(*m).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    }));
    let header = Row::new(header_cells).style(Style::default().bg(Color::DarkGray));

    let rows = app.heatmap.rows.iter().map(|row| {
        let mut cells = vec![Cell::from(truncate(&row.city, 18))];
        cells.extend(row.months.iter().map(|value| match value {
            Some(v) => Cell::from(format!("{:.1}", v)).style(
                Style::default()
                    .fg(Color::Black)
                    .bg(category_color(classify(*v))),
            ),
            None => Cell::from("-").style(Style::default().fg(Color::DarkGray)),
        }));
        Row::new(cells)
    });

    let mut widths = vec![Constraint::Length(20)];
    widths.extend([Constraint::Length(7); 12]);

    let table = Table::new(rows, widths)
        .header(header)
        .block(bordered("Average AQI by City and Month"));
    f.render_widget(table, area);
}

fn render_top_cities(f: &mut Frame, area: Rect, app: &mut App) {
    let labels: Vec<String> = app.top.iter().map(|r| truncate(&r.city, 9)).collect();
    let bars: Vec<(&str, u64)> = labels
        .iter()
        .zip(app.top.iter())
        .map(|(l, r)| (l.as_str(), r.mean_aqi.max(0.0).round() as u64))
        .collect();

    let chart = BarChart::default()
        .block(bordered("Top 10 Most Polluted Cities (mean AQI)"))
        .data(&bars)
        .bar_width(9)
        .bar_gap(1)
        .bar_style(Style::default().fg(Color::Red))
        .value_style(Style::default().fg(Color::White).bg(Color::Red));
    f.render_widget(chart, area);
}

fn render_what_if(f: &mut Frame, area: Rect, app: &mut App) {
    let baseline = app.baseline_aqi();
    let result = app.impact();
    let range = app.mitigation.ui_range();

    let mut lines = vec![
        Line::from(""),
        Line::from(vec![
            label("  Action:    "),
            Span::raw(app.mitigation.label()),
            Span::styled("  (t to switch)", Style::default().fg(Color::DarkGray)),
        ]),
        Line::from(vec![
            label("  Count:     "),
            Span::raw(format!("{}", app.mitigation.count())),
            Span::styled(
                format!("  ({}–{})", range.start(), range.end()),
                Style::default().fg(Color::DarkGray),
            ),
        ]),
        Line::from(vec![
            label("  Baseline:  "),
            Span::raw(format!("{:.2} ", baseline)),
            category_span(baseline),
        ]),
        Line::from(""),
        Line::from("  ─────────────────────────────────────"),
        Line::from(""),
        Line::from(vec![
            label("  New AQI:          "),
            Span::raw(format!("{:.2} ", result.new_aqi)),
            category_span(result.new_aqi),
        ]),
        Line::from(vec![
            label("  AQI reduction:    "),
            Span::styled(format!("{:.3}", result.aqi_reduction), Style::default().fg(Color::Green)),
        ]),
        Line::from(vec![
            label("  PM2.5 reduction:  "),
            Span::raw(format!("{:.3} µg/m³", result.pm25_reduction)),
        ]),
    ];

    if let Some(no2) = result.no2_reduction {
        lines.push(Line::from(vec![
            label("  NO2 reduction:    "),
            Span::raw(format!("{:.3} µg/m³", no2)),
        ]));
    }

    lines.push(Line::from(vec![
        label("  CO2 reduction:    "),
        Span::raw(format!("{:.1} tonnes/year", result.co2_reduction)),
    ]));

    let paragraph = Paragraph::new(lines).block(bordered("What If - Environmental Impact"));
    f.render_widget(paragraph, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let hints: &[(&str, &str)] = match app.current_page {
        Page::CityAqi | Page::Heatmap | Page::TopCities => &[("↑/↓", " City")],
        Page::Compare => &[("↑/↓", " City 1"), ("←/→", " City 2")],
        Page::Predict => &[("↑/↓", " Field"), ("←/→", " Adjust"), ("PgUp/PgDn", " ×10"), ("1-6", " Profiles")],
        Page::WhatIf => &[("←/→", " Count"), ("t", " Action")],
    };

    let mut status_spans = vec![Span::styled(
        format!(" {} ", app.current_page.title()),
        Style::default().fg(Color::Cyan),
    )];

    for (key, action) in hints {
        status_spans.push(Span::raw(" | "));
        status_spans.push(Span::styled(*key, Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(*action));
    }

    status_spans.push(Span::raw(" | "));
    status_spans.push(Span::styled("Tab", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Page | "));
    status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    status_spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{}…", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aqi_dashboard::LinearModel;
    use chrono::NaiveDate;

    fn record(city: &str, aqi: f64) -> AirQualityRecord {
        AirQualityRecord {
            city: city.to_string(),
            date: NaiveDate::from_ymd_opt(2020, 3, 1).unwrap(),
            pm25: 10.0,
            pm10: 20.0,
            no2: 5.0,
            co: 0.5,
            o3: 12.0,
            aqi,
        }
    }

    fn app(with_model: bool) -> App {
        let model: Option<Box<dyn ModelPort>> = if with_model {
            Some(Box::new(LinearModel::new(0.0, [1.0, 0.0, 0.0, 0.0, 0.0])))
        } else {
            None
        };
        App::new(
            vec![record("Delhi", 300.0), record("Bengaluru", 65.0), record("Chennai", 60.0)],
            model,
            RecommendationTable::builtin(),
        )
    }

    #[test]
    fn test_page_cycle() {
        let mut page = Page::CityAqi;
        for _ in 0..Page::ALL.len() {
            assert_eq!(page.next().previous(), page);
            page = page.next();
        }
        assert_eq!(page, Page::CityAqi);
    }

    #[test]
    fn test_city_navigation_wraps() {
        let mut app = app(false);
        assert_eq!(app.selected_city(), Some("Bengaluru"));
        assert_eq!(app.compare_city(), Some("Chennai"));

        app.previous_city();
        assert_eq!(app.selected_city(), Some("Delhi"));
        app.next_city();
        assert_eq!(app.selected_city(), Some("Bengaluru"));

        app.cycle_compare_city(true);
        app.cycle_compare_city(true);
        assert_eq!(app.compare_city(), Some("Bengaluru"));
        app.cycle_compare_city(false);
        assert_eq!(app.compare_city(), Some("Delhi"));
    }

    #[test]
    fn test_reading_adjustment_is_clamped() {
        let mut app = app(true);
        app.adjust_reading(-1000.0);
        assert_eq!(app.readings.pm25, 0.0);

        app.previous_field(); // wraps to O3
        assert_eq!(app.selected_pollutant(), Pollutant::O3);

        app.previous_field(); // CO steps by 0.1
        app.adjust_reading(3.0);
        assert_eq!(app.readings.co, 1.3);
        app.adjust_reading(1000.0);
        assert_eq!(app.readings.co, 10.0);
    }

    #[test]
    fn test_profile_toggle_keeps_order() {
        let mut app = app(true);
        app.toggle_profile(HealthProfile::Children);
        app.toggle_profile(HealthProfile::Asthma);
        app.toggle_profile(HealthProfile::Elderly);
        app.toggle_profile(HealthProfile::Asthma);

        assert_eq!(app.profiles, vec![HealthProfile::Children, HealthProfile::Elderly]);
    }

    #[test]
    fn test_baseline_prefers_prediction() {
        let with_model = app(true);
        assert_eq!(with_model.selected_city(), Some("Bengaluru"));
        assert_eq!(with_model.baseline_aqi(), 80.0); // PM2.5 form default, not the 65.0 mean

        let without_model = app(false);
        assert_eq!(without_model.baseline_aqi(), 65.0); // Bengaluru mean
        assert!(without_model.prediction().is_none());
    }

    #[test]
    fn test_mitigation_steps_stay_in_range() {
        let mut app = app(true);
        app.adjust_mitigation(false);
        assert_eq!(app.mitigation, MitigationAction::PlantTrees { count: 10_000 });

        for _ in 0..50 {
            app.adjust_mitigation(true);
        }
        assert_eq!(app.mitigation, MitigationAction::PlantTrees { count: 100_000 });

        app.toggle_mitigation();
        app.adjust_mitigation(true);
        assert_eq!(app.mitigation, MitigationAction::RemoveCars { count: 1_500 });

        let result = app.impact();
        assert!(result.no2_reduction.is_some());
        assert!(result.new_aqi < 80.0);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Delhi", 9), "Delhi");
        assert_eq!(truncate("Thiruvananthapuram", 9), "Thiruvan…");
    }
}
