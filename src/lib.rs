/*!
# CGPA Calculator

A student GPA/CGPA calculator delivered as a small web application, built in Rust.

## Overview

Students pick an academic part and semester, enter a letter grade for each course
offered, and get the semester GPA and cumulative CGPA back. Failed courses are
tracked as carry-overs and offered again when a later part's semester with the same
label is opened. Finished calculations are saved to a record store that an
administrator can browse and reload.

## Architecture

### Core (always built)
- **grades**: Grade scale and the GPA/CGPA aggregation
- **session**: Per-session state, carry-over tracking and course listings
- **catalog**: Course reference data and the `CourseLookup` seam
- **store**: `RecordStore` seam and the gzip/bincode file store
- **config**: Environment configuration
- **error**: `GpaError`, shared by every layer

### Web layer (feature `web`)
- **app**: Routing, handlers and middleware
- **login**: Cookie sessions and the admin PIN gate
- **views**: Handlebars pages

## Grading

| Grade | Points |
|-------|--------|
| A     | 5      |
| B     | 4      |
| C     | 3      |
| D     | 2      |
| E     | 1      |
| F     | 0      |

GPAs are rounded half up to two decimals. Ungraded courses carry no points or units
but still count toward the total course count.

## REST API Endpoints

- `GET /api/courses/{part}/{semester}` - Courses for a part/semester, with carry-overs
- `POST /api/add_semester` - Records a semester's grades and returns updated GPAs
- `POST /api/reset_session` - Clears the in-progress calculation
- `POST /api/save_calculation` - Persists the calculation and clears the session
- `GET /api/records-admin/records` - Saved calculations (admin only)
*/

pub mod catalog;
pub mod config;
pub mod error;
pub mod grades;
pub mod session;
pub mod store;

#[cfg(feature = "web")]
pub mod app;
#[cfg(feature = "web")]
pub mod login;
#[cfg(feature = "web")]
pub mod views;

/// Re-export the core so callers can `use cgpa::*`
pub use catalog::*;
pub use config::*;
pub use error::*;
pub use grades::*;
pub use session::*;
pub use store::*;
