//! Browser presentation layer: DOM keyboard grid, overlays, keydown routing,
//! audio playback, and the frame loop driving the engine's logical clock.
//!
//! All game state lives in the engine; this module only builds DOM once at
//! startup, forwards raw key events, and re-renders from the snapshot every
//! animation frame. Audio playback is fire-and-forget: failures are logged to
//! the console and never reach the engine.

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, window};

use crate::catalog::{self, ANIMALS};
use crate::engine::{Command, EngineConfig, IndexPicker, MoleEngine, Snapshot};

const KEYBOARD_ROWS: [&[char]; 3] = [
    &['Q', 'W', 'E', 'R', 'T', 'Y', 'U', 'I', 'O', 'P'],
    &['A', 'S', 'D', 'F', 'G', 'H', 'J', 'K', 'L'],
    &['Z', 'X', 'C', 'V', 'B', 'N', 'M', ',', '.', '/'],
];

const KEY_STYLE_IDLE: &str = "position:relative; height:72px; width:60px; border-radius:14px; border:3px solid #7bc47f; background:#ffffff; display:flex; align-items:center; justify-content:center; font-family:'Fira Code', monospace; font-size:26px; font-weight:bold; color:#2e7d32; transition:all 0.15s;";
const KEY_STYLE_ACTIVE: &str = "position:relative; height:72px; width:60px; border-radius:14px; border:3px solid #e53935; background:#ffebee; display:flex; align-items:center; justify-content:center; font-family:'Fira Code', monospace; font-size:26px; font-weight:bold; color:#c62828; transform:scale(1.12); box-shadow:0 0 0 4px rgba(229,57,53,0.45); transition:all 0.15s;";
const KEY_STYLE_WRONG: &str = "position:relative; height:72px; width:60px; border-radius:14px; border:3px solid #fb8c00; background:#fff3e0; display:flex; align-items:center; justify-content:center; font-family:'Fira Code', monospace; font-size:26px; font-weight:bold; color:#ef6c00; transform:scale(1.05); transition:all 0.15s;";

struct GameSession {
    engine: MoleEngine,
    started: bool,
}

thread_local! {
    static GAME: std::cell::RefCell<Option<GameSession>> = std::cell::RefCell::new(None);
}

fn now_ms() -> f64 {
    window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or(0.0)
}

fn rand_index(len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    #[cfg(feature = "rng")]
    {
        let mut buf = [0u8; 4];
        if getrandom::getrandom(&mut buf).is_ok() {
            return u32::from_le_bytes(buf) as usize % len;
        }
    }
    // Fallback: linear transform of the performance clock (not crypto secure).
    (now_ms() as u64 as usize)
        .wrapping_mul(1664525)
        .wrapping_add(1013904223)
        % len
}

fn browser_picker() -> IndexPicker {
    Box::new(rand_index)
}

fn config_for_mode(mode: &str) -> EngineConfig {
    match mode {
        "countdown" => EngineConfig::countdown(),
        "frenzy" => EngineConfig::frenzy(),
        _ => EngineConfig::classic(),
    }
}

/// Set up the DOM, the keydown listener, and the frame loop for one game
/// session. The engine is created immediately but only starts spawning on the
/// first keypress, so cue playback happens after a user interaction.
pub fn launch(mode: &str) -> Result<(), JsValue> {
    let win = window().ok_or_else(|| JsValue::from_str("no window"))?;
    let doc = win
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;

    build_page(&doc)?;

    let engine = MoleEngine::new(&ANIMALS, config_for_mode(mode), browser_picker());
    GAME.with(|cell| {
        cell.replace(Some(GameSession {
            engine,
            started: false,
        }))
    });

    // Keyboard listener: space pauses, letters resolve, anything else passes
    // through untouched.
    {
        let closure = Closure::wrap(Box::new(move |evt: web_sys::KeyboardEvent| {
            let key = evt.key();
            GAME.with(|cell| {
                if let Some(session) = cell.borrow_mut().as_mut() {
                    if !session.started {
                        session.started = true;
                        session.engine.start(now_ms());
                    }
                    if key == " " {
                        evt.prevent_default();
                        session.engine.toggle_pause();
                        return;
                    }
                    if key.chars().count() == 1 {
                        let c = key.chars().next().unwrap();
                        if c.is_ascii_alphabetic() {
                            session.engine.resolve_key(c);
                        }
                    }
                }
            });
        }) as Box<dyn FnMut(_)>);
        doc.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }

    start_frame_loop();
    Ok(())
}

type FrameCallback = std::rc::Rc<std::cell::RefCell<Option<Closure<dyn FnMut(f64)>>>>;

fn start_frame_loop() {
    let f: FrameCallback = std::rc::Rc::new(std::cell::RefCell::new(None));
    let g = f.clone();
    *g.borrow_mut() = Some(Closure::wrap(Box::new(move |_ts: f64| {
        GAME.with(|cell| {
            if let Some(session) = cell.borrow_mut().as_mut() {
                session.engine.tick(now_ms());
                for cmd in session.engine.drain_commands() {
                    run_command(cmd);
                }
                if let Some(doc) = window().and_then(|w| w.document()) {
                    render(&doc, &session.engine.snapshot(), session.started);
                }
            }
        });
        if let Some(w) = window() {
            let _ =
                w.request_animation_frame(f.borrow().as_ref().unwrap().as_ref().unchecked_ref());
        }
    }) as Box<dyn FnMut(f64)>));
    if let Some(w) = window() {
        let _ = w.request_animation_frame(g.borrow().as_ref().unwrap().as_ref().unchecked_ref());
    }
}

fn run_command(cmd: Command) {
    match cmd {
        Command::PlayCue { text } => play_cue(&text),
    }
}

fn play_cue(text: &str) {
    let url = catalog::audio_url(text);
    match web_sys::HtmlAudioElement::new_with_src(&url) {
        Ok(audio) => {
            if let Err(e) = audio.play() {
                web_sys::console::warn_1(&e);
            }
        }
        Err(e) => web_sys::console::warn_1(&e),
    }
}

// --- DOM construction --------------------------------------------------------

fn build_page(doc: &Document) -> Result<(), JsValue> {
    let body = doc
        .body()
        .ok_or_else(|| JsValue::from_str("no document body"))?;

    ensure_div(doc, "mk-title", "position:fixed; top:18px; left:50%; transform:translateX(-50%); font-family:'Noto Serif SC', serif; font-size:34px; font-weight:bold; color:#2e7d32; z-index:30;", "打地鼠游戏")?;
    ensure_div(doc, "mk-score", "position:fixed; top:64px; left:50%; transform:translateX(-50%); font-family:'Fira Code', monospace; font-size:22px; font-weight:bold; color:#388e3c; z-index:30;", "得分: 0")?;
    ensure_div(doc, "mk-status", "position:fixed; top:96px; left:50%; transform:translateX(-50%); font-family:'Fira Code', monospace; font-size:14px; color:#66bb6a; z-index:30;", "按空格键暂停/继续 | 按任意字母键开始游戏")?;
    ensure_div(doc, "mk-banner", "position:fixed; bottom:36px; left:50%; transform:translateX(-50%); font-family:'Noto Serif SC', serif; font-size:24px; font-weight:bold; padding:10px 22px; border-radius:16px; background:#e3f2fd; color:#1565c0; box-shadow:0 2px 12px rgba(0,0,0,0.15); z-index:30;", "按任意字母键开始游戏")?;

    if doc.get_element_by_id("mk-board").is_none() {
        let board = doc.create_element("div")?;
        board.set_id("mk-board");
        board.set_attribute("style", "position:fixed; top:50%; left:50%; transform:translate(-50%,-50%); display:flex; flex-direction:column; gap:8px; align-items:center; z-index:20;")?;
        for row in KEYBOARD_ROWS {
            let row_div = doc.create_element("div")?;
            row_div.set_attribute("style", "display:flex; gap:8px; justify-content:center;")?;
            for &key in row {
                let cell = doc.create_element("div")?;
                cell.set_id(&format!("mk-key-{key}"));
                cell.set_attribute("style", KEY_STYLE_IDLE)?;
                cell.set_text_content(Some(&key.to_string()));
                row_div.append_child(&cell)?;
            }
            board.append_child(&row_div)?;
        }
        body.append_child(&board)?;
    }
    Ok(())
}

fn ensure_div(doc: &Document, id: &str, style: &str, text: &str) -> Result<Element, JsValue> {
    if let Some(el) = doc.get_element_by_id(id) {
        return Ok(el);
    }
    let body = doc
        .body()
        .ok_or_else(|| JsValue::from_str("no document body"))?;
    let div = doc.create_element("div")?;
    div.set_id(id);
    div.set_attribute("style", style)?;
    div.set_text_content(Some(text));
    body.append_child(&div)?;
    Ok(div)
}

// --- Per-frame rendering -----------------------------------------------------

fn render(doc: &Document, snap: &Snapshot, started: bool) {
    if let Some(el) = doc.get_element_by_id("mk-score") {
        el.set_text_content(Some(&format!("得分: {}", snap.score)));
    }

    for row in KEYBOARD_ROWS {
        for &key in row {
            let Some(cell) = doc.get_element_by_id(&format!("mk-key-{key}")) else {
                continue;
            };
            let target = snap.targets.iter().find(|t| t.letter == key);
            let style = if target.is_some() {
                KEY_STYLE_ACTIVE
            } else if snap.wrong_key == Some(key) {
                KEY_STYLE_WRONG
            } else {
                KEY_STYLE_IDLE
            };
            cell.set_attribute("style", style).ok();
            match target {
                Some(t) => {
                    let countdown = t
                        .remaining_ms
                        .map(|ms| {
                            format!(
                                "<span style='position:absolute; bottom:2px; right:6px; font-size:11px; color:#c62828;'>{}</span>",
                                (ms / 1000.0).ceil() as u32
                            )
                        })
                        .unwrap_or_default();
                    cell.set_inner_html(&format!(
                        "<span style='position:absolute; top:-2px; left:50%; transform:translateX(-50%); font-size:34px;'>{}</span><span style='position:absolute; bottom:2px; left:6px; font-size:14px;'>{}</span>{}",
                        t.emoji, key, countdown
                    ));
                }
                None => cell.set_text_content(Some(&key.to_string())),
            }
        }
    }

    let banner = if !started {
        "按任意字母键开始游戏".to_string()
    } else if snap.paused {
        "已暂停 - 按空格键继续".to_string()
    } else if snap.wrong_key.is_some() {
        match &snap.hint {
            Some(h) => format!("按错了哦！要按 {}", h.letter),
            None => String::new(),
        }
    } else {
        match &snap.hint {
            Some(h) => format!("{} 按 {} 键 ({})", h.emoji, h.letter, h.name),
            None => String::new(),
        }
    };
    if let Some(el) = doc.get_element_by_id("mk-banner") {
        el.set_text_content(Some(&banner));
        let display = if banner.is_empty() { "none" } else { "block" };
        // Toggle visibility without rebuilding the styled element.
        let style = format!("position:fixed; bottom:36px; left:50%; transform:translateX(-50%); font-family:'Noto Serif SC', serif; font-size:24px; font-weight:bold; padding:10px 22px; border-radius:16px; background:#e3f2fd; color:#1565c0; box-shadow:0 2px 12px rgba(0,0,0,0.15); z-index:30; display:{display};");
        el.set_attribute("style", &style).ok();
    }
    if let Some(el) = doc.get_element_by_id("mk-status") {
        let text = if snap.paused {
            "(已暂停 - 按空格继续)"
        } else {
            "按空格键暂停/继续 | 按任意字母键开始游戏"
        };
        el.set_text_content(Some(text));
    }
}
