/*!
# csvgen

A form for editing a small table or entering a stock ticker, backed by a CSV
service. Each user action is one HTTP call; the result is either a CSV file
saved for the user or a table of debt-to-equity ratios.

## Architecture

### Front end
- **Form state** (`form`) - Rows, ticker input, last ratio result and the
  loading/error line. Every transition is a plain method, so the whole state
  machine is testable without a network.
- **Controller** (`controller`) - Runs one backend call per action and feeds
  the outcome back into the form state. Only one action is in flight at a time.
- **Terminal view** (`view`) - Renders the table, ratios and status line.

### Backend access
- **HTTP client** (`api`) - `ExportApi` trait with a reqwest implementation.
- **Downloads** (`downloader`) - `SaveBytes` capability: write into a
  directory, stream to stdout, or keep in memory.

### CSV service
- **Server** (`server`, feature `server`) - axum router serving
  `/api/generate-csv` and `/api/health`.

## REST API Endpoints

- `POST /api/generate-csv` - `{ rows }` to CSV
- `POST /api/debt-to-equity` - `{ ticker }` to `{ data }` or `{ error }`
- `POST /api/debt-to-equity-csv` - `{ ticker }` to CSV
- `POST /api/cash-flow-csv` - `{ ticker }` to CSV
- `GET /api/health` - `{ status }`

The two ratio CSVs and the ratio lookup come from an external service.
*/

pub mod api;
pub mod config;
pub mod controller;
pub mod downloader;
pub mod error;
pub mod form;
pub mod server;
pub mod view;

pub use api::{ExportApi, HttpApi};
pub use config::Config;
pub use controller::Controller;
pub use downloader::{DirectorySaver, MemorySaver, SaveBytes, SavedFile, StdoutSaver};
pub use error::{ApiError, Error, FormError, Result, SaveError};
pub use form::{ExportKind, FormState, RatioRow, Row, RowField, Ticker};
