//! Persisted State Store
//!
//! Dauerhafte Ablage des `FixtureState`. Jeder Schreibvorgang ersetzt den
//! kompletten Datensatz (nie Überschreiben eines längeren alten Inhalts).

use crate::error::StoreError;
use crate::record::{self, READ_CAPACITY, RECORD_CAPACITY};
use crate::traits::RecordStorage;
use crate::types::FixtureState;

/// Persisted State Store über einem Byte-Speicher
pub struct StateStore<S: RecordStorage> {
    storage: S,
}

impl<S: RecordStorage> StateStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// Liest den kompletten Datensatz
    ///
    /// `NotFound` beim ersten Start muss der Aufrufer behandeln (Default
    /// anlegen); der Store selbst erfindet keinen Zustand.
    pub fn load(&mut self) -> Result<FixtureState, StoreError> {
        let mut buffer = [0u8; READ_CAPACITY];
        match self.storage.read_record(&mut buffer)? {
            Some(len) => record::decode(&buffer[..len]),
            None => Err(StoreError::NotFound),
        }
    }

    /// Read-Modify-Write als eine logische Transaktion
    ///
    /// Liest den aktuellen Zustand (Default wenn nicht vorhanden), wendet
    /// `mutator` an, schreibt das vollständige Ergebnis zurück und gibt es
    /// zurück. Ein korrupter Datensatz wird NICHT überschrieben.
    pub fn update(
        &mut self,
        mutator: impl FnOnce(FixtureState) -> FixtureState,
    ) -> Result<FixtureState, StoreError> {
        let current = match self.load() {
            Ok(state) => state,
            Err(StoreError::NotFound) => FixtureState::default(),
            Err(error) => return Err(error),
        };

        let next = mutator(current);
        self.replace(&next)?;
        Ok(next)
    }

    /// Überschreibt den Datensatz bedingungslos mit `snapshot`
    pub fn replace(&mut self, snapshot: &FixtureState) -> Result<(), StoreError> {
        let mut buffer = [0u8; RECORD_CAPACITY];
        let len = record::encode(snapshot, &mut buffer)?;
        self.storage.write_record(&buffer[..len])
    }

    /// Ersetzt den Datensatz durch den Default (aus, schwarz)
    ///
    /// Einziger Weg, einen korrupten Datensatz zu verwerfen.
    pub fn restore_defaults(&mut self) -> Result<FixtureState, StoreError> {
        let state = FixtureState::default();
        self.replace(&state)?;
        Ok(state)
    }
}
