//! JavaScript bindings.
//!
//! ```javascript
//! import init, { CheckersGame, playerWhite } from 'checkers';
//!
//! await init();
//! const game = new CheckersGame("classic");
//! game.makeMove(1, 2, 0, 3);
//! game.proposeDraw(playerWhite());
//! const bytes = game.save();
//! const resumed = CheckersGame.load(bytes);
//! ```

use std::fmt::Display;

use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::ai::Players;
use crate::game::Game;
use crate::ruleset::Ruleset;
use crate::snapshot::Snapshot;
use crate::types::{self, Color};

/// Player code of Black (`PLAYER_BLACK`).
#[wasm_bindgen(js_name = playerBlack)]
pub fn player_black() -> u8 {
    types::PLAYER_BLACK
}

/// Player code of White (`PLAYER_WHITE`).
#[wasm_bindgen(js_name = playerWhite)]
pub fn player_white() -> u8 {
    types::PLAYER_WHITE
}

#[wasm_bindgen]
pub struct CheckersGame {
    game: Game,
}

#[wasm_bindgen]
impl CheckersGame {
    /// Starts a two-human game with a named ruleset preset.
    #[wasm_bindgen(constructor)]
    pub fn new(preset: &str) -> Result<CheckersGame, JsValue> {
        let ruleset = Ruleset::preset(preset)
            .ok_or_else(|| JsValue::from_str(&format!("unknown ruleset preset: {preset}")))?;
        Self::start(ruleset, Players::default())
    }

    /// Starts a game from a ruleset object and a `{ black, white }` player
    /// assignment.
    #[wasm_bindgen(js_name = withConfig)]
    pub fn with_config(ruleset: JsValue, players: JsValue) -> Result<CheckersGame, JsValue> {
        let ruleset: Ruleset = serde_wasm_bindgen::from_value(ruleset)?;
        let players: Players = serde_wasm_bindgen::from_value(players)?;
        Self::start(ruleset, players)
    }

    /// Resumes a game from bytes produced by [`CheckersGame::save`].
    pub fn load(bytes: &[u8]) -> Result<CheckersGame, JsValue> {
        let snapshot = Snapshot::decode(bytes).map_err(to_js_error)?;
        let game = Game::from_snapshot(&snapshot).map_err(to_js_error)?;
        Ok(Self { game })
    }

    #[wasm_bindgen(js_name = presetNames)]
    pub fn preset_names() -> Vec<String> {
        Ruleset::preset_names()
            .into_iter()
            .map(str::to_owned)
            .collect()
    }

    pub fn save(&self) -> Vec<u8> {
        self.game.snapshot().encode()
    }

    /// Current [`GameView`](crate::types::GameView).
    pub fn state(&self) -> Result<JsValue, JsValue> {
        to_js_value(&self.game.view())
    }

    pub fn ruleset(&self) -> Result<JsValue, JsValue> {
        to_js_value(self.game.ruleset())
    }

    #[wasm_bindgen(js_name = legalMoves)]
    pub fn legal_moves(&self) -> Result<JsValue, JsValue> {
        to_js_value(&self.game.available_moves())
    }

    #[wasm_bindgen(js_name = isMoveValid)]
    pub fn is_move_valid(&self, from_x: i32, from_y: i32, to_x: i32, to_y: i32) -> bool {
        self.game.is_move_valid(from_x, from_y, to_x, to_y)
    }

    #[wasm_bindgen(js_name = isPieceMovable)]
    pub fn is_piece_movable(&self, player: u8, x: i32, y: i32) -> bool {
        Color::from_player_code(player)
            .is_some_and(|color| self.game.is_piece_movable(color, x, y))
    }

    #[wasm_bindgen(js_name = isAiTurn)]
    pub fn is_ai_turn(&self) -> bool {
        self.game.is_ai_turn()
    }

    #[wasm_bindgen(js_name = setPlayers)]
    pub fn set_players(&mut self, players: JsValue) -> Result<(), JsValue> {
        let players: Players = serde_wasm_bindgen::from_value(players)?;
        self.game.set_players(players);
        Ok(())
    }

    /// Plays one step and returns the outcome name.
    #[wasm_bindgen(js_name = makeMove)]
    pub fn make_move(
        &mut self,
        from_x: i32,
        from_y: i32,
        to_x: i32,
        to_y: i32,
    ) -> Result<JsValue, JsValue> {
        let outcome = self
            .game
            .make_move(from_x, from_y, to_x, to_y)
            .map_err(to_js_error)?;
        to_js_value(&outcome)
    }

    #[wasm_bindgen(js_name = aiMove)]
    pub fn ai_move(&mut self) -> Result<JsValue, JsValue> {
        let outcome = self.game.do_ai_move().map_err(to_js_error)?;
        to_js_value(&outcome)
    }

    #[wasm_bindgen(js_name = endTurn)]
    pub fn end_turn(&mut self) -> Result<(), JsValue> {
        self.game.end_turn().map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = proposeDraw)]
    pub fn propose_draw(&mut self, player: u8) -> Result<(), JsValue> {
        let color = color_from_code(player)?;
        self.game.propose_draw(color).map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = acceptDraw)]
    pub fn accept_draw(&mut self, player: u8) -> Result<(), JsValue> {
        let color = color_from_code(player)?;
        self.game.accept_draw(color).map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = rejectDraw)]
    pub fn reject_draw(&mut self, player: u8) -> Result<(), JsValue> {
        let color = color_from_code(player)?;
        self.game.reject_draw(color).map_err(to_js_error)
    }

    pub fn forfeit(&mut self, player: u8) -> Result<(), JsValue> {
        let color = color_from_code(player)?;
        self.game.forfeit(color).map_err(to_js_error)
    }
}

impl CheckersGame {
    fn start(ruleset: Ruleset, players: Players) -> Result<Self, JsValue> {
        let game = Game::with_players(ruleset, players).map_err(to_js_error)?;
        Ok(Self { game })
    }

    pub fn game(&self) -> &Game {
        &self.game
    }
}

fn color_from_code(code: u8) -> Result<Color, JsValue> {
    Color::from_player_code(code)
        .ok_or_else(|| JsValue::from_str(&format!("unknown player code: {code}")))
}

fn to_js_value<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    Ok(serde_wasm_bindgen::to_value(value)?)
}

fn to_js_error(err: impl Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}
