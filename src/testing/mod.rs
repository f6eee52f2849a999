//! Shared fixtures for the integration test suite: a seeded in-memory
//! store with two cities, three collaborators and a handful of rows per
//! table, plus a pinned clock so token expiry is deterministic.

use std::sync::Arc;

use axum::Router;
use chrono::{TimeZone, Utc};
use serde_json::json;

use crate::app::{app, AppState};
use crate::auth::Clock;
use crate::store::MemoryStore;

// Bearer tokens seeded in the access-token table
pub const TOK_ADMIN: &str = "tok-admin";
pub const TOK_LILLE: &str = "tok-lille";
pub const TOK_NOCITY: &str = "tok-nocity";
pub const TOK_EXPIRED: &str = "tok-expired";

// Collaborator record ids
pub const ID_ADMIN: &str = "recADMIN000000001";
pub const ID_LILLE: &str = "recLILLE000000001";
pub const ID_NOCITY: &str = "recNOCITY00000001";

// City record ids
pub const ID_VILLE_LILLE: &str = "recVILLELILLE0001";
pub const ID_VILLE_PARIS: &str = "recVILLEPARIS0001";

// Category record ids
pub const ID_CAT_FOOD: &str = "recCATFOOD0000001";

/// A fully wired application over a seeded [`MemoryStore`]. The store handle
/// stays accessible so tests can assert on write effects with `dump`.
pub struct TestApp {
    pub store: Arc<MemoryStore>,
    pub state: AppState,
}

impl TestApp {
    pub fn router(&self) -> Router {
        app(self.state.clone())
    }
}

/// The clock every fixture runs under.
pub fn test_clock() -> Clock {
    Clock::fixed(Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap())
}

pub fn seeded_app() -> TestApp {
    let store = Arc::new(seeded_store());
    let state = AppState::new(store.clone(), test_clock());
    TestApp { store, state }
}

pub fn seeded_store() -> MemoryStore {
    let store = MemoryStore::new();

    store.register_table("Villes EPICU", "Ville EPICU");
    store.register_table("Collaborateurs", "Nom");
    store.register_table("Établissements", "Nom de l'établissement");
    store.register_table("Catégories", "Nom");
    store.register_table("Agenda", "Date");
    store.register_table("Access tokens", "Token");
    store.register_table("Factures", "Numéro");
    store.register_table("Publications", "Titre");
    store.register_table("Créneaux", "Date");
    store.register_table("Tickets", "Sujet");
    store.register_table("Ressources", "Nom");

    store.seed_with_id("Villes EPICU", ID_VILLE_LILLE, json!({ "Ville EPICU": "Lille" }));
    store.seed_with_id("Villes EPICU", ID_VILLE_PARIS, json!({ "Ville EPICU": "Paris" }));

    store.seed_with_id(
        "Collaborateurs",
        ID_ADMIN,
        json!({ "Nom": "Durand", "Prénom": "Alice", "Rôle": "Administrateur",
                "Email": "alice@epicu.fr", "Téléphone": "0600000001" }),
    );
    store.seed_with_id(
        "Collaborateurs",
        ID_LILLE,
        json!({ "Nom": "Martin", "Prénom": "Benoît", "Rôle": "Franchisé",
                "Email": "benoit@epicu.fr", "Ville EPICU": [ID_VILLE_LILLE] }),
    );
    store.seed_with_id(
        "Collaborateurs",
        ID_NOCITY,
        json!({ "Nom": "Petit", "Prénom": "Chloé", "Rôle": "Franchisé",
                "Email": "chloe@epicu.fr" }),
    );

    for (token, user, expiration) in [
        (TOK_ADMIN, ID_ADMIN, "2027-01-01T00:00:00Z"),
        (TOK_LILLE, ID_LILLE, "2027-01-01T00:00:00Z"),
        (TOK_NOCITY, ID_NOCITY, "2027-01-01T00:00:00Z"),
        (TOK_EXPIRED, ID_LILLE, "2025-01-01T00:00:00Z"),
    ] {
        store.seed(
            "Access tokens",
            json!({ "Token": token, "Expiration": expiration, "Collaborateur": [user] }),
        );
    }

    store.seed_with_id("Catégories", ID_CAT_FOOD, json!({ "Nom": "FOOD" }));

    // Lille establishments across the prospection pipeline
    store.seed(
        "Établissements",
        json!({ "Nom de l'établissement": "Le Bistrot", "Ville": "Lille",
                "Statut de prospection": "Glacial",
                "Catégorie": [ID_CAT_FOOD],
                "Ville EPICU": [ID_VILLE_LILLE],
                "Suivi par": [ID_LILLE],
                "Téléphone": "0320000001", "SIRET": "11111111100011" }),
    );
    store.seed(
        "Établissements",
        json!({ "Nom de l'établissement": "Chez Marcel", "Ville": "Lille",
                "Statut de prospection": "Prospect",
                "Ville EPICU": [ID_VILLE_LILLE] }),
    );
    store.seed(
        "Établissements",
        json!({ "Nom de l'établissement": "Aux Trois Brasseurs", "Ville": "Lille",
                "Statut de prospection": "Glacial",
                "Ville EPICU": [ID_VILLE_LILLE] }),
    );
    // Paris establishment, invisible to the Lille franchisee
    store.seed(
        "Établissements",
        json!({ "Nom de l'établissement": "Café Parisien", "Ville": "Paris",
                "Statut de prospection": "Glacial",
                "Ville EPICU": [ID_VILLE_PARIS] }),
    );

    store.seed(
        "Agenda",
        json!({ "Date": "2026-06-10", "Type": "Tournage",
                "Description": "Tournage au Bistrot",
                "Ville EPICU": [ID_VILLE_LILLE], "Collaborateur": [ID_LILLE] }),
    );
    store.seed(
        "Agenda",
        json!({ "Date": "2026-06-12", "Type": "Rendez-vous",
                "Description": "RDV Café Parisien",
                "Ville EPICU": [ID_VILLE_PARIS], "Collaborateur": [ID_ADMIN] }),
    );

    store.seed(
        "Factures",
        json!({ "Numéro": "F-2026-001", "Montant": 450.0, "Statut": "Payée",
                "Date d'émission": "2026-05-02",
                "Ville EPICU": [ID_VILLE_LILLE] }),
    );

    store.seed(
        "Publications",
        json!({ "Titre": "Reel Le Bistrot", "Date de publication": "2026-05-20",
                "Statut": "Publiée", "Ville EPICU": [ID_VILLE_LILLE] }),
    );

    store.seed(
        "Créneaux",
        json!({ "Date": "2026-06-15", "Statut": "Libre",
                "Ville EPICU": [ID_VILLE_LILLE] }),
    );

    store.seed(
        "Tickets",
        json!({ "Sujet": "Accès Airtable", "Description": "Je n'ai plus accès",
                "Statut": "Ouvert", "Collaborateur": [ID_LILLE] }),
    );

    store.seed(
        "Ressources",
        json!({ "Nom": "Template story", "Type": "Canva",
                "URL": "https://canva.com/t/story",
                "Description": "Story 9:16" }),
    );
    store.seed(
        "Ressources",
        json!({ "Nom": "Guide interne", "Type": "PDF",
                "URL": "https://example.com/guide.pdf" }),
    );

    store
}
