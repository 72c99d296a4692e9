/*!
# Mareero Inventory Dashboard

A small web dashboard for a spare-parts business: staff log inventory events
(missing items, new requests, ...) into a shared worksheet, and a
password-gated manager console shows headline counts, lets the manager edit or
delete rows, and exports PDF and Excel reports.

## Architecture

### Frontend Layer
- **Technologies**: server-rendered HTML (handlebars templates), plain forms
- **Pages**:
  - Staff entry - branch, employee, category, item and note
  - Manager console - login, metrics, charts, downloads, editable grid

### Backend Layer
- **Technologies**: Rust, axum
- **Core Components**:
  - Backing store - whole-worksheet read / replace with a version check
  - Entry Form - validates and appends one record
  - Dashboard - total / missing / new-request counts
  - Report Generator - PDF (summary, charts, listing) and Excel exports
  - Row Editor - saves grid edits or drops flagged rows

### Data Persistence Layer
- Gzip-compressed bincode snapshot per worksheet
- Every write bumps the worksheet version; writes based on an older version
  are refused

## Modules

- **record**: LogRecord, Table and entry validation
- **config**: start-up configuration and the category vocabulary
- **store**: backing store trait and in-memory store
- **saving**: file-backed store
- **entry**: Entry Form submission
- **dashboard**: manager metrics and value counts
- **editor**: Row Editor save / delete
- **graph**: chart rendering
- **downloader**: Excel export and download names
- **report**: PDF report
- **login**: manager secret check and sessions
- **app**: routing and handlers

## REST Endpoints

- `GET /` - staff entry form, `POST /entry` - submit it
- `GET /manager` - login form or manager console
- `POST /manager/login`, `POST /manager/logout`
- `GET /manager/report.pdf`, `GET /manager/data.xlsx` - downloads
- `GET /manager/charts/{category,branch}.png` - dashboard charts
- `POST /manager/rows` - save edits or delete selected rows
*/

pub mod config;
pub mod dashboard;
pub mod downloader;
pub mod editor;
pub mod entry;
pub mod graph;
pub mod login;
pub mod record;
pub mod report;
pub mod saving;
pub mod store;

#[cfg(feature = "web")]
pub mod app;

/// Re-export the types most callers need
pub use config::{AppConfig, CategoryRole, Vocabulary};
pub use dashboard::Metrics;
pub use record::{LogRecord, NewEntry, Table};
pub use saving::FileStore;
pub use store::{MemoryStore, SheetStore, StoreError};
