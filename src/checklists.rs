//! Predefined Inspection Checklists
//!
//! The fixed checklist texts used on site, and the per-screen board that
//! holds independent checklist instances and tracks which one is open.

use thiserror::Error;

use crate::domain::{Approval, ApprovalRejected, Checklist, ChecklistItem, ChecklistSection, Progress};

struct SectionTemplate {
    id: &'static str,
    title: &'static str,
    items: &'static [(u32, &'static str)],
}

const EXCAVATION: &[SectionTemplate] = &[
    SectionTemplate {
        id: "excavation-works",
        title: "Excavation Works",
        items: &[
            (1, "Verify approval of materials used in the item's execution and inspect equipment before starting work."),
            (2, "Confirm approval of workshop drawings required for execution and review site boundaries."),
            (3, "Ensure the execution method for the item is approved."),
            (4, "Verify required tests are conducted per specifications, and review soil reports/groundwater analysis."),
            (5, "Confirm handover of foundational items supporting the current item."),
            (6, "Ensure the site is handed over without obstructions."),
            (7, "Confirm site cleanliness before starting work."),
            (8, "Review design drawings, technical specifications, other documents, and the execution program."),
            (9, "Verify occupational safety conditions for item handover."),
            (10, "Ensure the ground is free of water pipes, electrical cables, and gas connections."),
            (11, "Confirm excavation does not affect adjacent structures."),
            (12, "Verify removal of waste generated during execution."),
            (13, "Designate storage areas before excavation begins."),
        ],
    },
    SectionTemplate {
        id: "excavation-handover",
        title: "Excavation Works Handover Checklist",
        items: &[
            (1, "Verify coordinates of excavation boundaries match building boundaries."),
            (2, "Review foundation level and excavation depth against the soil report."),
            (3, "Confirm foundation level aligns with the design."),
            (4, "Check cleanliness, evenness, and disinfection of the excavation base and sides."),
            (5, "Ensure foundation soil type matches the soil report."),
            (6, "If excavation depth exceeds requirements, confirm backfilling with plain concrete to the specified level."),
        ],
    },
];

const BACKFILLING: &[SectionTemplate] = &[
    SectionTemplate {
        id: "backfilling",
        title: "Backfilling",
        items: &[
            (1, "Verify approval of materials used for execution and inspect equipment/machinery before work begins."),
            (2, "Confirm approval of workshop drawings required for execution."),
            (3, "Ensure the execution method for the item is approved."),
            (4, "Verify required tests per specifications, and review soil reports/compaction tests."),
            (5, "Confirm handover of foundational items supporting the current item."),
            (6, "Ensure the isolation work is handed over before backfilling begins."),
            (7, "Review design drawings, technical specifications, and other documents."),
            (8, "Verify occupational safety conditions for item handover."),
            (9, "Confirm removal of waste generated during execution."),
            (10, "Designate storage and curing areas."),
        ],
    },
    SectionTemplate {
        id: "backfilling-handover",
        title: "Backfilling Works Handover Checklist",
        items: &[
            (1, "Confirm backfill layer thickness matches consultant recommendations."),
            (2, "Verify elevation of the backfill layer (foundation level)."),
            (3, "Ensure compaction method aligns with consultant recommendations."),
            (4, "Verify weight used for compaction complies with consultant instructions."),
            (5, "Confirm compaction test results and water content percentage before proceeding to the next layer."),
            (6, "Ensure the replacement layer matches approved samples and is free of impurities/organic materials."),
            (7, "Confirm backfill elevation meets the final specified level."),
        ],
    },
];

const WHITE_CONCRETE: &[SectionTemplate] = &[
    SectionTemplate {
        id: "pre-handover",
        title: "Pre-handover Checklist",
        items: &[
            (1, "Verify approval of materials used in the item's execution and inspect equipment before starting work."),
            (2, "Confirm approval of workshop drawings required for execution and review site boundaries."),
            (3, "Ensure the execution method for the item is approved."),
            (4, "Verify required tests are conducted per specifications."),
            (5, "Confirm handover of foundational items supporting the current item."),
            (6, "Review design drawings, technical specifications, and other documents."),
            (7, "Verify occupational safety conditions for item handover."),
            (8, "Confirm removal of waste generated during execution."),
        ],
    },
    SectionTemplate {
        id: "works-inspection",
        title: "Works Inspection Checklist",
        items: &[
            (9, "Ensure the cleanliness of the foundation level and completion of final surface leveling"),
            (10, "Ensure spraying of insecticides before starting concrete works"),
            (11, "Verify alignment with construction drawings and correct corner markings"),
            (12, "Review foundation dimensions and ensure proper white concrete layer thickness"),
            (13, "Proper backfilling of foundation sides and sealing of any voids"),
            (14, "Confirm the concrete level matches with other foundation levels"),
            (15, "Ensure the water supply is ready before pouring"),
            (16, "Follow the supervisor's instructions during concrete pouring"),
        ],
    },
];

/// The inspection workflows available on site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChecklistKind {
    Excavation,
    Backfilling,
    WhiteConcrete,
}

impl ChecklistKind {
    pub fn title(&self) -> &'static str {
        match self {
            ChecklistKind::Excavation => "Excavation",
            ChecklistKind::Backfilling => "Backfilling",
            ChecklistKind::WhiteConcrete => "White Concrete",
        }
    }

    fn subject(&self) -> &'static str {
        match self {
            ChecklistKind::Excavation => "excavation",
            ChecklistKind::Backfilling => "backfilling",
            ChecklistKind::WhiteConcrete => "white concrete",
        }
    }

    fn template(&self) -> &'static [SectionTemplate] {
        match self {
            ChecklistKind::Excavation => EXCAVATION,
            ChecklistKind::Backfilling => BACKFILLING,
            ChecklistKind::WhiteConcrete => WHITE_CONCRETE,
        }
    }

    /// A fresh, fully unchecked instance
    pub fn instantiate(&self) -> Checklist {
        let sections = self
            .template()
            .iter()
            .map(|section| {
                let items = section
                    .items
                    .iter()
                    .map(|(id, text)| ChecklistItem::new(*id, *text))
                    .collect();
                ChecklistSection::new(section.id, section.title, items)
            })
            .collect();
        Checklist::new(self.title(), self.subject(), sections)
    }
}

/// What a board is currently showing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Home,
    Checklist(ChecklistKind),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("{} checklist is not part of this screen", .0.title())]
    NotOnBoard(ChecklistKind),
    #[error(transparent)]
    Rejected(#[from] ApprovalRejected),
}

/// One screen's checklists. Each kind has its own instance; toggles on one
/// never reach another.
#[derive(Debug, Clone)]
pub struct InspectionBoard {
    checklists: Vec<(ChecklistKind, Checklist)>,
    view: View,
}

impl InspectionBoard {
    pub fn new(kinds: &[ChecklistKind]) -> Self {
        let mut checklists: Vec<(ChecklistKind, Checklist)> = Vec::with_capacity(kinds.len());
        for kind in kinds {
            if !checklists.iter().any(|(k, _)| k == kind) {
                checklists.push((*kind, kind.instantiate()));
            }
        }
        Self {
            checklists,
            view: View::Home,
        }
    }

    /// Excavation and backfilling, side by side
    pub fn excavation_screen() -> Self {
        Self::new(&[ChecklistKind::Excavation, ChecklistKind::Backfilling])
    }

    pub fn white_concrete_screen() -> Self {
        Self::new(&[ChecklistKind::WhiteConcrete])
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn kinds(&self) -> impl Iterator<Item = ChecklistKind> + '_ {
        self.checklists.iter().map(|(kind, _)| *kind)
    }

    pub fn checklist(&self, kind: ChecklistKind) -> Option<&Checklist> {
        self.checklists
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, checklist)| checklist)
    }

    fn checklist_mut(&mut self, kind: ChecklistKind) -> Option<&mut Checklist> {
        self.checklists
            .iter_mut()
            .find(|(k, _)| *k == kind)
            .map(|(_, checklist)| checklist)
    }

    /// Show a checklist. Returns false if the kind is not on this board.
    pub fn open(&mut self, kind: ChecklistKind) -> bool {
        if self.checklist(kind).is_none() {
            return false;
        }
        self.view = View::Checklist(kind);
        true
    }

    pub fn go_home(&mut self) {
        self.view = View::Home;
    }

    pub fn toggle(&mut self, kind: ChecklistKind, section_id: &str, item_id: u32) -> Option<bool> {
        self.checklist_mut(kind)?.toggle_item(section_id, item_id)
    }

    pub fn progress(&self, kind: ChecklistKind) -> Option<Progress> {
        self.checklist(kind).map(Checklist::progress)
    }

    /// Approve one checklist. Success returns the board to `Home`; a
    /// rejection leaves the checklist and the view as they were.
    pub fn approve(&mut self, kind: ChecklistKind) -> Result<Approval, BoardError> {
        let checklist = self.checklist(kind).ok_or(BoardError::NotOnBoard(kind))?;
        let approval = checklist.approve()?;
        log::info!("{} checklist approved", kind.title());
        self.view = View::Home;
        Ok(approval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check_all(board: &mut InspectionBoard, kind: ChecklistKind) {
        let targets: Vec<(String, u32)> = board
            .checklist(kind)
            .unwrap()
            .sections()
            .iter()
            .flat_map(|s| s.items().iter().map(move |i| (s.id().to_string(), i.id())))
            .collect();
        for (section, item) in targets {
            board.toggle(kind, &section, item);
        }
    }

    #[test]
    fn test_catalog_sizes() {
        assert_eq!(ChecklistKind::Excavation.instantiate().progress().total, 19);
        assert_eq!(ChecklistKind::Backfilling.instantiate().progress().total, 17);
        assert_eq!(ChecklistKind::WhiteConcrete.instantiate().progress().total, 16);
    }

    #[test]
    fn test_fresh_instances_unchecked() {
        for kind in [
            ChecklistKind::Excavation,
            ChecklistKind::Backfilling,
            ChecklistKind::WhiteConcrete,
        ] {
            let checklist = kind.instantiate();
            assert!(!checklist.is_fully_checked());
            assert_eq!(checklist.progress().checked, 0);
        }
    }

    #[test]
    fn test_toggles_do_not_leak_between_checklists() {
        let mut board = InspectionBoard::excavation_screen();
        assert_eq!(
            board.toggle(ChecklistKind::Excavation, "excavation-works", 1),
            Some(true)
        );

        assert_eq!(board.progress(ChecklistKind::Excavation).unwrap().checked, 1);
        assert_eq!(board.progress(ChecklistKind::Backfilling).unwrap().checked, 0);
    }

    #[test]
    fn test_rejected_approval_keeps_view() {
        let mut board = InspectionBoard::excavation_screen();
        assert!(board.open(ChecklistKind::Backfilling));

        let err = board.approve(ChecklistKind::Backfilling).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Please complete all backfilling checklist items before approval."
        );
        assert_eq!(board.view(), View::Checklist(ChecklistKind::Backfilling));
    }

    #[test]
    fn test_successful_approval_returns_home() {
        let mut board = InspectionBoard::excavation_screen();
        board.open(ChecklistKind::Excavation);
        check_all(&mut board, ChecklistKind::Excavation);

        let approval = board.approve(ChecklistKind::Excavation).unwrap();
        assert_eq!(
            approval.message,
            "All excavation items checked! Excavation work approved."
        );
        assert_eq!(board.view(), View::Home);
        assert!(board.checklist(ChecklistKind::Excavation).unwrap().is_fully_checked());
    }

    #[test]
    fn test_kind_not_on_board() {
        let mut board = InspectionBoard::white_concrete_screen();
        assert!(!board.open(ChecklistKind::Excavation));
        assert_eq!(board.view(), View::Home);
        assert_eq!(board.toggle(ChecklistKind::Excavation, "excavation-works", 1), None);
        assert_eq!(
            board.approve(ChecklistKind::Excavation),
            Err(BoardError::NotOnBoard(ChecklistKind::Excavation))
        );
    }

    #[test]
    fn test_white_concrete_ids_continue_across_sections() {
        let mut board = InspectionBoard::white_concrete_screen();
        assert_eq!(board.toggle(ChecklistKind::WhiteConcrete, "works-inspection", 9), Some(true));
        assert_eq!(board.toggle(ChecklistKind::WhiteConcrete, "pre-handover", 9), None);
        assert_eq!(
            board.kinds().collect::<Vec<_>>(),
            vec![ChecklistKind::WhiteConcrete]
        );
    }
}
