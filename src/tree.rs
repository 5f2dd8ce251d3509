//! Note tree
//!
//! Turns the flat list of notes into roots and children, indexed once per build

use std::collections::HashMap;
use std::collections::HashSet;

use uuid::Uuid;

use crate::notes::Note;

/// Parent to children index over a list of notes
///
/// Notes in the trash are left out, the input order is kept for roots and children
#[derive(Debug)]
pub struct NoteTree<'a> {
    /// Active notes, in input order
    notes: Vec<&'a Note>,

    /// Positions in `notes` of the notes without a parent
    roots: Vec<usize>,

    /// Positions in `notes` of the children of a note
    children: HashMap<Uuid, Vec<usize>>,
}

/// A note with its nested children
#[derive(Debug, PartialEq, Eq)]
pub struct NoteNode<'a> {
    pub note: &'a Note,
    pub children: Vec<NoteNode<'a>>,
}

impl<'a> NoteTree<'a> {
    /// Build the index in a single pass
    pub fn new(notes: &'a [Note]) -> Self {
        let notes = notes
            .iter()
            .filter(|note| !note.is_deleted())
            .collect::<Vec<&Note>>();

        let mut roots = Vec::new();
        let mut children = HashMap::<Uuid, Vec<usize>>::new();

        for (position, note) in notes.iter().enumerate() {
            match note.parent_id {
                Some(parent_id) => children.entry(parent_id).or_default().push(position),
                None => roots.push(position),
            }
        }

        Self {
            notes,
            roots,
            children,
        }
    }

    /// Notes without a parent
    pub fn roots(&self) -> impl Iterator<Item = &'a Note> + '_ {
        self.roots.iter().map(|position| self.notes[*position])
    }

    /// Direct children of a note
    pub fn children(&self, id: &Uuid) -> impl Iterator<Item = &'a Note> + '_ {
        self.children
            .get(id)
            .into_iter()
            .flatten()
            .map(|position| self.notes[*position])
    }

    /// All roots with their children nested
    pub fn nested(&self) -> Vec<NoteNode<'a>> {
        let mut visited = HashSet::new();

        self.roots()
            .map(|note| self.node(note, &mut visited))
            .collect()
    }

    /// A single note with its children nested, `None` when the note is not in the tree
    pub fn subtree(&self, id: &Uuid) -> Option<NoteNode<'a>> {
        let note = self.notes.iter().copied().find(|note| &note.id == id)?;

        Some(self.node(note, &mut HashSet::new()))
    }

    /// Nest the children of a note, every note shows up at most once
    ///
    /// A note that is its own ancestor stops the descent instead of looping forever
    fn node(&self, note: &'a Note, visited: &mut HashSet<Uuid>) -> NoteNode<'a> {
        visited.insert(note.id);

        let mut children = Vec::new();

        for child in self.children(&note.id) {
            if !visited.contains(&child.id) {
                children.push(self.node(child, visited));
            }
        }

        NoteNode { note, children }
    }
}
