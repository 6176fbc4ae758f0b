//! Server-rendered HTML pages.

use std::fmt::Write;

use crate::engine::dex::{DexEntry, GameEntry, Progress, SortMode};
use crate::engine::state::TrackerState;

const SELECT_JS: &str = include_str!("../../static/select.js");
const THEME_JS: &str = include_str!("../../static/theme.js");
const TRACKER_JS: &str = include_str!("../../static/tracker.js");
const DISPLAY_JS: &str = include_str!("../../static/display.js");
const STYLE_CSS: &str = include_str!("../../static/style.css");

pub fn static_asset(file: &str) -> Option<(&'static str, &'static str)> {
    match file {
        "select.js" => Some(("text/javascript; charset=utf-8", SELECT_JS)),
        "theme.js" => Some(("text/javascript; charset=utf-8", THEME_JS)),
        "tracker.js" => Some(("text/javascript; charset=utf-8", TRACKER_JS)),
        "display.js" => Some(("text/javascript; charset=utf-8", DISPLAY_JS)),
        "style.css" => Some(("text/css; charset=utf-8", STYLE_CSS)),
        _ => None,
    }
}

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn page(title: &str, body: &str, scripts: &[&str]) -> String {
    let mut html = String::new();
    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n\
         <link rel=\"stylesheet\" href=\"/static/style.css\">\n</head>\n<body>\n{}",
        escape(title),
        body
    );
    for script in scripts {
        let _ = writeln!(html, "<script src=\"/static/{}\"></script>", script);
    }
    html.push_str("</body>\n</html>\n");
    html
}

fn options(values: &[String], selected: &str) -> String {
    let mut out = String::new();
    for v in values {
        let _ = writeln!(
            out,
            "<option value=\"{0}\"{1}>{0}</option>",
            escape(v),
            if v == selected { " selected" } else { "" }
        );
    }
    out
}

pub fn select_page(generations: &[String], games: &[String], state: &TrackerState) -> String {
    let body = format!(
        "<button id=\"theme-toggle\">Dark Mode</button>\n\
         <h1>Choose a game</h1>\n\
         <form method=\"post\" action=\"/select\">\n\
         <label>Generation <select name=\"generation\">\n{}</select></label>\n\
         <label>Game <select name=\"game\">\n{}</select></label>\n\
         <button type=\"submit\">Start</button>\n\
         </form>\n",
        options(generations, &state.generation),
        options(games, &state.game),
    );
    page("Select game", &body, &["theme.js", "select.js"])
}

pub struct TrackerView<'a> {
    pub state: &'a TrackerState,
    pub pokemon: &'a GameEntry,
    pub caught: bool,
    pub uncaught_list: &'a [DexEntry],
    pub caught_list: &'a [DexEntry],
    pub sort: SortMode,
}

fn dex_rows(list: &[DexEntry], game: &str) -> String {
    let mut out = String::new();
    for p in list {
        let location = p.locations.get(game).map(String::as_str).unwrap_or("");
        let _ = writeln!(
            out,
            "<li class=\"dex-entry\" data-id=\"{id}\"><img src=\"{img}\" alt=\"\" loading=\"lazy\">\
             <span class=\"dex-id\">#{id:03}</span> {name} <small>{loc}</small></li>",
            id = p.id,
            img = escape(&p.img_url),
            name = escape(&p.name),
            loc = escape(location),
        );
    }
    out
}

pub fn tracker_page(view: &TrackerView<'_>) -> String {
    let state = view.state;
    let sort = view.sort.as_str();
    let other_sort = match view.sort {
        SortMode::Dex => SortMode::Catch,
        SortMode::Catch => SortMode::Dex,
    };
    let body = format!(
        "<button id=\"theme-toggle\">Dark Mode</button>\n\
         <nav><a href=\"/select\">Change game</a> | <a href=\"/display\" target=\"_blank\">Display</a> | \
         <a href=\"/tracker?sort={other}\">Sort by {other}</a></nav>\n\
         <h1>{generation} &middot; {game}</h1>\n\
         <section class=\"current\">\n\
         <img src=\"{img}\" alt=\"{name}\">\n\
         <h2>{name}</h2>\n<p>{location}</p>\n<p class=\"status\">{status}</p>\n\
         <form method=\"post\" action=\"/tracker\">\n\
         <input type=\"hidden\" name=\"sort\" value=\"{sort}\">\n\
         <button name=\"action\" value=\"prev\">Previous</button>\n\
         <button name=\"action\" value=\"toggle\">{toggle}</button>\n\
         <button name=\"action\" value=\"next\">Next</button>\n\
         </form>\n\
         <label>Title size <input id=\"title-size\" type=\"number\" min=\"8\" max=\"200\" value=\"{title_size}\"></label>\n\
         </section>\n\
         <h3>Still needed ({uncaught_count})</h3>\n<ul class=\"dex-list\">\n{uncaught}</ul>\n\
         <h3>Caught ({caught_count})</h3>\n<ul class=\"dex-list caught\">\n{caught}</ul>\n",
        other = other_sort.as_str(),
        generation = escape(&state.generation),
        game = escape(&state.game),
        img = escape(&view.pokemon.img_url),
        name = escape(&view.pokemon.name),
        location = escape(&view.pokemon.location),
        status = if view.caught { "Caught" } else { "Not caught" },
        sort = sort,
        toggle = if view.caught { "Mark uncaught" } else { "Mark caught" },
        title_size = state.title_size,
        uncaught_count = view.uncaught_list.len(),
        uncaught = dex_rows(view.uncaught_list, &state.game),
        caught_count = view.caught_list.len(),
        caught = dex_rows(view.caught_list, &state.game),
    );
    page("Living dex tracker", &body, &["theme.js", "tracker.js"])
}

pub fn display_page(pokemon: &GameEntry, progress: &Progress) -> String {
    let img = if pokemon.img_url.is_empty() {
        String::new()
    } else {
        format!("<img class=\"sprite\" src=\"{}\" alt=\"\">\n", escape(&pokemon.img_url))
    };
    let body = format!(
        "<main class=\"display\" data-index=\"{index}\" data-caught=\"{caught}\" data-total=\"{total}\">\n\
         <h1 style=\"font-size: {size}px\">{name}</h1>\n{img}\
         <p class=\"location\">{location}</p>\n\
         <p class=\"progress\">{caught} / {total}</p>\n\
         </main>\n",
        index = progress.index,
        caught = progress.caught_count,
        total = progress.total_count,
        size = progress.title_size,
        name = escape(&pokemon.name),
        img = img,
        location = escape(&pokemon.location),
    );
    page(&pokemon.name, &body, &["display.js"])
}
