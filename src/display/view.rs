//! In-memory model of everything the UI shows
//!
//! Steps mutate this model; the panes only read it. Because rendering never
//! feeds back into the model, a step that copies one register into another
//! always sees the result of the steps before it, however far the drawing lags.

use super::{DisplaySurface, Element, Emphasis, Field};
use crate::environment::EnvironmentSnapshot;
use crate::machine::{Flag, Register, MAX_MEMORY_KB};
use crate::protocol::MemoryDump;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, warn};

/// Memory shown before the interpreter reports its configuration
pub const DEFAULT_MEMORY_KB: usize = 1;

/// Commentary lines kept for display
const COMMENTARY_LIMIT: usize = 1000;

#[derive(Debug, Clone)]
pub struct MachineView {
    registers: FxHashMap<Register, String>,
    flags: FxHashMap<Flag, String>,
    memory: Vec<u8>,
    bold: FxHashSet<Element>,
    flashing: FxHashSet<Element>,
    commentary: Vec<String>,
    steps_rendered: usize,
}

impl MachineView {
    pub fn new() -> Self {
        let mut view = MachineView {
            registers: FxHashMap::default(),
            flags: FxHashMap::default(),
            memory: Vec::new(),
            bold: FxHashSet::default(),
            flashing: FxHashSet::default(),
            commentary: Vec::new(),
            steps_rendered: 0,
        };
        for register in Register::CONTROL.into_iter().chain(Register::GENERAL) {
            view.registers.insert(register, "0".to_string());
        }
        for flag in Flag::ALL {
            view.flags.insert(flag, "0".to_string());
        }
        view.resize_memory(DEFAULT_MEMORY_KB);
        view
    }

    /// Size the memory grid to `memory_kb * 1024` zeroed cells, at most
    /// [`MAX_MEMORY_KB`]
    pub fn resize_memory(&mut self, memory_kb: usize) {
        if memory_kb > MAX_MEMORY_KB {
            warn!(memory_kb, limit = MAX_MEMORY_KB, "memory size clamped");
        }
        let cells = memory_kb.min(MAX_MEMORY_KB) * 1024;
        debug!(cells, "sizing memory grid");
        self.memory = vec![0; cells];
        self.bold.retain(|e| !matches!(e, Element::Memory(_)));
        self.flashing.retain(|e| !matches!(e, Element::Memory(_)));
    }

    /// Copy a memory dump into the grid starting at address 0
    pub fn load_memory(&mut self, dump: &MemoryDump) {
        let mut truncated = false;
        for (offset, value) in dump.cells() {
            match self.memory.get_mut(offset) {
                Some(cell) => *cell = value,
                None => {
                    truncated = true;
                    break;
                }
            }
        }
        if truncated {
            warn!(
                dump = dump.bytes.len(),
                grid = self.memory.len(),
                "memory dump larger than grid, truncated"
            );
        }
    }

    /// Overwrite PC, general registers, flags and memory from a snapshot
    pub fn apply_environment(&mut self, env: &EnvironmentSnapshot) {
        self.registers.insert(Register::Pc, env.pc.to_string());
        for register in Register::GENERAL {
            if let Some(value) = env.genregs.get(register) {
                self.registers.insert(register, value.to_string());
            }
        }
        for flag in Flag::ALL {
            self.flags.insert(flag, env.cmp.get(flag).to_string());
        }
        self.load_memory(&MemoryDump {
            bytes: env.memory.clone(),
        });
    }

    pub fn register(&self, register: Register) -> &str {
        self.registers.get(&register).map(String::as_str).unwrap_or("")
    }

    pub fn flag(&self, flag: Flag) -> &str {
        self.flags.get(&flag).map(String::as_str).unwrap_or("")
    }

    pub fn memory(&self) -> &[u8] {
        &self.memory
    }

    pub fn is_bold(&self, element: Element) -> bool {
        self.bold.contains(&element)
    }

    pub fn is_flashing(&self, element: Element) -> bool {
        self.flashing.contains(&element)
    }

    /// Either kind of emphasis
    pub fn is_highlighted(&self, element: Element) -> bool {
        self.is_bold(element) || self.is_flashing(element)
    }

    /// Lowest memory address touched by the last step, if any
    pub fn first_flashing_address(&self) -> Option<usize> {
        self.flashing
            .iter()
            .filter_map(|e| match e {
                Element::Memory(address) => Some(*address),
                _ => None,
            })
            .min()
    }

    pub fn commentary(&self) -> &[String] {
        &self.commentary
    }

    pub fn steps_rendered(&self) -> usize {
        self.steps_rendered
    }
}

impl Default for MachineView {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplaySurface for MachineView {
    fn set_text(&mut self, field: Field, text: String) {
        match field {
            Field::Register(register) => {
                self.registers.insert(register, text);
            }
            Field::Flag(flag) => {
                self.flags.insert(flag, text);
            }
        }
    }

    fn text(&self, field: Field) -> String {
        match field {
            Field::Register(register) => self.register(register).to_string(),
            Field::Flag(flag) => self.flag(flag).to_string(),
        }
    }

    fn set_emphasis(&mut self, element: Element, emphasis: Emphasis) {
        match emphasis {
            Emphasis::Normal => {
                self.bold.remove(&element);
                self.flashing.remove(&element);
            }
            Emphasis::Bold => {
                self.bold.insert(element);
            }
            Emphasis::Flash => {
                self.flashing.insert(element);
            }
        }
    }

    fn write_byte(&mut self, address: usize, value: u8) -> bool {
        match self.memory.get_mut(address) {
            Some(cell) => {
                *cell = value;
                true
            }
            None => false,
        }
    }

    fn read_byte(&self, address: usize) -> Option<u8> {
        self.memory.get(address).copied()
    }

    fn notify(&mut self, text: &str) {
        self.commentary.push(text.to_string());
        if self.commentary.len() > COMMENTARY_LIMIT {
            let excess = self.commentary.len() - COMMENTARY_LIMIT;
            self.commentary.drain(..excess);
        }
    }

    fn begin_step(&mut self) {
        self.flashing.clear();
        self.steps_rendered += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::step::{notify, AnimationStep};
    use crate::display::render_step;

    fn run(view: &mut MachineView, steps: &[AnimationStep]) {
        for step in steps {
            render_step(step, view);
        }
    }

    #[test]
    fn test_comparison_flags_are_mutually_exclusive() {
        let mut view = MachineView::new();
        for raised in Flag::ALL {
            run(&mut view, &[AnimationStep::SetFlag(raised)]);
            for flag in Flag::ALL {
                let expected = if flag == raised { "1" } else { "0" };
                assert_eq!(view.flag(flag), expected);
            }
        }
    }

    #[test]
    fn test_fetch_cycle_reads_memory_into_cir() {
        let mut view = MachineView::new();
        view.load_memory(&MemoryDump {
            bytes: vec![0, 0, 7, 8, 9],
        });
        run(
            &mut view,
            &[
                AnimationStep::SetRegister {
                    register: Register::Pc,
                    value: "2".into(),
                },
                AnimationStep::ReadMemory { address: 2, size: 3 },
            ],
        );
        assert_eq!(view.register(Register::Mdr), "007,008,009");
        assert!(view.is_flashing(Element::Memory(3)));

        run(
            &mut view,
            &[AnimationStep::MoveRegister {
                from: Register::Mdr,
                to: Register::Cir,
                value: None,
            }],
        );
        assert_eq!(view.register(Register::Cir), "007,008,009");
        assert!(!view.is_flashing(Element::Memory(3)));
        assert!(view.is_flashing(Element::Register(Register::Cir)));
    }

    #[test]
    fn test_emphasis_persists_until_reset() {
        let mut view = MachineView::new();
        run(
            &mut view,
            &[
                AnimationStep::Emphasize {
                    register: Register::Ebx,
                    on: true,
                },
                notify("in between"),
            ],
        );
        assert!(view.is_bold(Element::Register(Register::Ebx)));
        run(
            &mut view,
            &[AnimationStep::Emphasize {
                register: Register::Ebx,
                on: false,
            }],
        );
        assert!(!view.is_highlighted(Element::Register(Register::Ebx)));
    }

    #[test]
    fn test_write_memory_stops_at_grid_end() {
        let mut view = MachineView::new();
        view.resize_memory(1);
        run(
            &mut view,
            &[AnimationStep::WriteMemory {
                address: 1022,
                bytes: vec![1, 2, 3],
            }],
        );
        assert_eq!(&view.memory()[1022..], &[1, 2]);
        assert_eq!(view.memory().len(), 1024);
    }

    #[test]
    fn test_resize_memory_is_clamped() {
        let mut view = MachineView::new();
        view.resize_memory(usize::MAX);
        assert_eq!(view.memory().len(), MAX_MEMORY_KB * 1024);
    }

    #[test]
    fn test_transfers_at_end_of_address_space_do_not_panic() {
        let mut view = MachineView::new();
        run(
            &mut view,
            &[
                AnimationStep::ReadMemory {
                    address: usize::MAX,
                    size: usize::MAX,
                },
                AnimationStep::WriteMemory {
                    address: usize::MAX,
                    bytes: vec![1, 2],
                },
            ],
        );
        assert_eq!(view.register(Register::Mdr), "");
        assert!(view.memory().iter().all(|b| *b == 0));
        assert_eq!(view.steps_rendered(), 2);
    }

    #[test]
    fn test_apply_environment() {
        let env = EnvironmentSnapshot::from_json(
            r#"{"pc": 9, "genregs": {"eax": 1, "ebx": 2, "ecx": 3, "edx": 4,
                "esi": 5, "edi": 6, "ebp": 7, "esp": 8},
                "cmp": {"p": 1, "e": 0, "n": 0}, "memory": [4, 5]}"#,
        )
        .unwrap();
        let mut view = MachineView::new();
        view.apply_environment(&env);
        assert_eq!(view.register(Register::Pc), "9");
        assert_eq!(view.register(Register::Edi), "6");
        assert_eq!(view.flag(Flag::Greater), "1");
        assert_eq!(&view.memory()[..3], &[4, 5, 0]);
    }
}
