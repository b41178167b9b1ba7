use crate::aggregator::planner::PageIndex;
use anyhow::{bail, Result};
use std::sync::Mutex;

/// Outcome of placing one page result on the board.
#[derive(Debug, PartialEq, Eq)]
pub enum Placement {
    /// The page landed but other slots are still pending.
    Pending { completed: usize },
    /// This placement filled the last open slot; carries the concatenation of
    /// every slot in ascending index order.
    Completed(Vec<String>),
}

struct BoardState {
    slots: Vec<Option<Vec<String>>>,
    completed: usize,
}

/// Fixed-size, index-addressed assembly board for one run.
///
/// Each page index owns exactly one slot, so placement is race-free no matter
/// in which order fetches resolve. The slot write and the completed-count
/// increment-and-compare happen under a single lock, which is what makes the
/// completion signal fire exactly once: only the placement that fills the
/// final slot observes `completed == page_count`.
pub struct SlotBoard {
    state: Mutex<BoardState>,
}

impl SlotBoard {
    pub fn new(page_count: usize) -> Self {
        Self {
            state: Mutex::new(BoardState {
                slots: (0..page_count).map(|_| None).collect(),
                completed: 0,
            }),
        }
    }

    pub fn page_count(&self) -> usize {
        self.state.lock().unwrap().slots.len()
    }

    pub fn completed(&self) -> usize {
        self.state.lock().unwrap().completed
    }

    /// Places the result for `index`. Each index must be placed at most once;
    /// a second placement is a logic error because the planner emits every
    /// index exactly once.
    pub fn place(&self, index: PageIndex, owners: Vec<String>) -> Result<Placement> {
        let mut state = self.state.lock().unwrap();
        let page_count = state.slots.len();

        if index >= page_count {
            bail!("page index {index} is out of range for {page_count} slots");
        }
        if state.slots[index].is_some() {
            bail!("page slot {index} was already filled");
        }

        state.slots[index] = Some(owners);
        state.completed += 1;

        if state.completed == page_count {
            let owners = state
                .slots
                .iter_mut()
                .flat_map(|slot| slot.take().expect("every slot is filled at completion"))
                .collect();
            Ok(Placement::Completed(owners))
        } else {
            Ok(Placement::Pending {
                completed: state.completed,
            })
        }
    }
}
