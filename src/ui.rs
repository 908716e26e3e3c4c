// UI layer: the application controller. It builds the login menu and the
// main menu, binds their entries to the flows below and talks to the API
// client. Menus hand control to each other: a successful login stops the
// login menu and runs the main menu, a logout does the reverse.

use crate::api::{
    ApiClient, AuthOutcome, CreateOutcome, DeleteOutcome, FieldErrors, ListOutcome,
    RegistrationRequest, ReservationRecord,
};
use crate::console::{Console, Tone};
use crate::domain::{
    parse_date, Email, NewReservation, NumberOfSeats, Password, Reservation, ReservationId,
    ReservationPeriod, ReservedUmbrellaId, Username,
};
use crate::error::ValidationError;
use crate::menu::{Description, Entry, Menu, MenuBuilder};
use anyhow::{anyhow, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::cell::{OnceCell, RefCell};
use std::rc::{Rc, Weak};
use std::time::Duration;
use tracing::{debug, warn};

pub const APP_NAME_LOGIN: &str = "Umbrella Reservation Login";
pub const APP_NAME_MENU: &str = "Umbrella Reservation Menu";
pub const APP_EXIT_MESSAGE: &str = "Thank you for using our app, see you soon";

pub const LOGIN_FAILED: &str = "Login failed, please provide correct credential to continue...";
pub const LOGIN_OK_WELCOME: &str = "Login ok, welcome to our application";
pub const REGISTRATION_FAILED: &str = "Registration failed, please check the data you insert";
pub const REGISTRATION_OK_WELCOME: &str =
    "Registration done, now you can start use our application :)";
pub const PASSWORDS_DIFFERENT: &str = "Passwords are different, please write them another time";
pub const HELP_TIPS_HEADER: &str = "This could help you:";
pub const REQUEST_FAILED: &str = "Could not reach the reservation service";

pub const LOGOUT_FAILED: &str = "Logout failed, please try again";
pub const LOGGED_OUT: &str = "You are now logged out";

pub const RESERVATION_LIST_FAILED: &str = "Could not retrieve your reservations";
pub const NO_RESERVATION_FOUND: &str = "You have no reservations yet";
pub const RESERVATION_CREATED: &str = "Reservation done, enjoy the beach";
pub const RESERVATION_CREATE_FAILED: &str = "The reservation could not be made";
pub const DELETE_OK: &str = "deleted";
pub const DELETE_FAILED_ID_NOT_FOUND: &str = "There is no reservation with this id";
pub const DELETE_FAILED: &str = "The reservation could not be deleted";

const SEPARATOR_WIDTH: usize = 150;

/// The two menus the application switches between.
struct Menus {
    login: Menu,
    main: Menu,
}

/// Application controller. Create it with [`App::new`] and start it with
/// [`App::run`]; the call returns once the user exits.
pub struct App {
    api: RefCell<ApiClient>,
    console: Rc<dyn Console>,
    menus: OnceCell<Menus>,
}

/// Wraps a controller method as a menu action. The action holds a weak
/// reference so the menus, owned by the app, do not keep it alive.
fn bind(app: &Weak<App>, action: fn(&App)) -> impl Fn() + 'static {
    let app = app.clone();
    move || {
        if let Some(app) = app.upgrade() {
            action(&app);
        }
    }
}

/// Shows a spinner on stderr while `request` runs.
fn with_spinner<T>(message: &'static str, request: impl FnOnce() -> T) -> T {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    let result = request();
    spinner.finish_and_clear();
    result
}

fn reservation_row(cells: [String; 6]) -> String {
    let [id, umbrella, seats, from, to, price] = cells;
    format!("{id:<20}{umbrella:<25}{seats:<20}{from:<15}{to:<15}{price:<20}")
}

impl Menus {
    fn build(app: &Rc<App>) -> Result<Self> {
        let weak = Rc::downgrade(app);

        let login = MenuBuilder::new(Description::new(APP_NAME_LOGIN)?)
            .with_console(app.console.clone())?
            .with_entry(Entry::create("1", "Login", bind(&weak, App::do_login), false)?)?
            .with_entry(Entry::create(
                "2",
                "Register",
                bind(&weak, App::do_registration),
                false,
            )?)?
            .with_entry(Entry::create("0", "Exit", bind(&weak, App::say_goodbye), true)?)?
            .build()?;

        let main = MenuBuilder::new(Description::new(APP_NAME_MENU)?)
            .with_console(app.console.clone())?
            .with_auto_select(bind(&weak, App::show_reservations))?
            .with_entry(Entry::create(
                "1",
                "Make a new reservation",
                bind(&weak, App::make_new_reservation),
                false,
            )?)?
            .with_entry(Entry::create(
                "2",
                "Delete a reservation",
                bind(&weak, App::delete_reservation),
                false,
            )?)?
            .with_entry(Entry::create("3", "Logout", bind(&weak, App::do_logout), false)?)?
            .with_entry(Entry::create("0", "Exit", bind(&weak, App::say_goodbye), true)?)?
            .build()?;

        Ok(Menus { login, main })
    }
}

impl App {
    pub fn new(api: ApiClient, console: Rc<dyn Console>) -> Result<Rc<Self>> {
        let app = Rc::new(App {
            api: RefCell::new(api),
            console,
            menus: OnceCell::new(),
        });
        let menus = Menus::build(&app)?;
        app.menus
            .set(menus)
            .map_err(|_| anyhow!("application menus were already built"))?;
        Ok(app)
    }

    /// Runs the login menu. Blocks until the user exits.
    pub fn run(&self) -> Result<()> {
        let menus = self
            .menus
            .get()
            .context("application menus are not built")?;
        menus.login.run();
        Ok(())
    }

    fn success(&self, line: &str) {
        self.console.print_styled(line, Tone::Success);
    }

    fn failure(&self, line: &str) {
        self.console.print_styled(line, Tone::Failure);
    }

    fn report_request_error(&self, err: &anyhow::Error) {
        warn!(error = ?err, "request failed");
        self.failure(&format!("{}: {:#}", REQUEST_FAILED, err));
    }

    fn show_tips(&self, errors: &FieldErrors) {
        if errors.is_empty() {
            return;
        }
        self.failure(HELP_TIPS_HEADER);
        for message in errors.messages() {
            self.failure(&format!("\t{}", message));
        }
    }

    /// Prompts until `parse` accepts the (trimmed) answer, printing the
    /// help message of every rejected attempt. `None` when input runs out.
    fn ask_until_valid<T>(
        &self,
        prompt: &str,
        secret: bool,
        parse: impl Fn(&str) -> Result<T, ValidationError>,
    ) -> Option<T> {
        loop {
            let line = if secret {
                self.console.read_secret(prompt)?
            } else {
                self.console.read_line(prompt)?
            };
            match parse(line.trim()) {
                Ok(value) => return Some(value),
                Err(e) => self.failure(e.help_msg()),
            }
        }
    }

    fn start_session(&self, token: &str) {
        self.api.borrow_mut().set_token(token);
        debug!("session started");
        if let Some(menus) = self.menus.get() {
            menus.login.stop();
            menus.main.run();
        }
    }

    fn say_goodbye(&self) {
        self.success(APP_EXIT_MESSAGE);
    }

    fn do_login(&self) {
        let Some(username) = self.console.read_line("username: ") else {
            return;
        };
        let Some(password) = self.console.read_secret("password: ") else {
            return;
        };
        let outcome = with_spinner("Logging in...", || {
            self.api.borrow().login(username.trim(), password.trim())
        });
        match outcome {
            Ok(AuthOutcome::Authenticated(token)) => {
                self.success(LOGIN_OK_WELCOME);
                self.start_session(&token);
            }
            Ok(AuthOutcome::Rejected(errors)) => {
                self.failure(LOGIN_FAILED);
                self.show_tips(&errors);
            }
            Err(e) => self.report_request_error(&e),
        }
    }

    fn read_registration_fields(&self) -> Option<(Username, Email, Password, Password)> {
        let username = self.ask_until_valid("username: ", false, |s| Username::new(s))?;
        let email = self.ask_until_valid("email: ", false, |s| Email::new(s))?;
        let mut first_attempt = true;
        loop {
            if !first_attempt {
                self.failure(PASSWORDS_DIFFERENT);
            }
            first_attempt = false;
            let password = self.ask_until_valid("password: ", true, |s| Password::new(s))?;
            let repeated =
                self.ask_until_valid("repeat password: ", true, |s| Password::new(s))?;
            if password == repeated {
                return Some((username, email, password, repeated));
            }
        }
    }

    fn do_registration(&self) {
        let Some((username, email, password, repeated)) = self.read_registration_fields() else {
            return;
        };
        let request = RegistrationRequest::new(&username, &password, &repeated, &email);
        let outcome = with_spinner("Registering...", || self.api.borrow().register(&request));
        match outcome {
            Ok(AuthOutcome::Authenticated(token)) => {
                self.success(REGISTRATION_OK_WELCOME);
                self.start_session(&token);
            }
            Ok(AuthOutcome::Rejected(errors)) => {
                self.failure(REGISTRATION_FAILED);
                self.show_tips(&errors);
            }
            Err(e) => self.report_request_error(&e),
        }
    }

    fn read_new_reservation(&self) -> Option<NewReservation> {
        let umbrella_id = self.ask_until_valid("umbrella id: ", false, |s| {
            s.parse::<ReservedUmbrellaId>()
        })?;
        let number_of_seats =
            self.ask_until_valid("number of seats: ", false, |s| s.parse::<NumberOfSeats>())?;
        let period = loop {
            let start = self.ask_until_valid("start date (YYYY-MM-DD): ", false, parse_date)?;
            let end = self.ask_until_valid("end date (YYYY-MM-DD): ", false, parse_date)?;
            match ReservationPeriod::new(start, end) {
                Ok(period) => break period,
                Err(e) => self.failure(e.help_msg()),
            }
        };
        Some(NewReservation::new(umbrella_id, number_of_seats, period))
    }

    fn make_new_reservation(&self) {
        let Some(reservation) = self.read_new_reservation() else {
            return;
        };
        let outcome = with_spinner("Saving reservation...", || {
            self.api.borrow().create_reservation(&reservation)
        });
        match outcome {
            Ok(CreateOutcome::Created) => self.success(RESERVATION_CREATED),
            Ok(CreateOutcome::Rejected(errors)) => {
                self.failure(RESERVATION_CREATE_FAILED);
                self.show_tips(&errors);
            }
            Err(e) => self.report_request_error(&e),
        }
    }

    fn delete_reservation(&self) {
        let Some(id) = self.ask_until_valid(
            "Insert the id of the reservation you want to delete: ",
            false,
            |s| s.parse::<ReservationId>(),
        ) else {
            return;
        };
        let outcome = with_spinner("Deleting reservation...", || {
            self.api.borrow().delete_reservation(id)
        });
        match outcome {
            Ok(DeleteOutcome::Deleted) => {
                self.success(&format!("Reservation with id: {} {}", id, DELETE_OK))
            }
            Ok(DeleteOutcome::NotFound) => self.failure(DELETE_FAILED_ID_NOT_FOUND),
            Ok(DeleteOutcome::Failed(status)) => {
                warn!(%status, "reservation delete rejected");
                self.failure(DELETE_FAILED);
            }
            Err(e) => self.report_request_error(&e),
        }
    }

    fn show_reservations(&self) {
        let outcome = with_spinner("Loading reservations...", || {
            self.api.borrow().list_reservations()
        });
        match outcome {
            Ok(ListOutcome::Listed(records)) => self.print_reservations(&records),
            Ok(ListOutcome::Failed(status)) => {
                warn!(%status, "reservation list rejected");
                self.failure(RESERVATION_LIST_FAILED);
            }
            Err(e) => self.report_request_error(&e),
        }
    }

    fn print_reservations(&self, records: &[ReservationRecord]) {
        if records.is_empty() {
            self.console.print("");
            self.console.print(NO_RESERVATION_FOUND);
            self.console.print("");
            return;
        }
        let separator = "-".repeat(SEPARATOR_WIDTH);
        self.console.print(&separator);
        self.console.print(&reservation_row([
            "Reservation ID".into(),
            "Reserved umbrella ID".into(),
            "Number of seats".into(),
            "From".into(),
            "To".into(),
            "Reservation price".into(),
        ]));
        self.console.print(&separator);
        for record in records {
            match Reservation::try_from(record) {
                Ok(r) => self.console.print(&reservation_row([
                    r.id.to_string(),
                    r.umbrella_id.to_string(),
                    r.number_of_seats.to_string(),
                    r.period.start().to_string(),
                    r.period.end().to_string(),
                    r.price.to_string(),
                ])),
                Err(e) => {
                    warn!(id = record.id, error = %e, "skipping invalid reservation");
                    self.failure(e.help_msg());
                }
            }
        }
        self.console.print(&separator);
    }

    fn do_logout(&self) {
        let outcome = with_spinner("Logging out...", || self.api.borrow().logout());
        match outcome {
            Ok(true) => {
                self.success(LOGGED_OUT);
                self.api.borrow_mut().clear_token();
                debug!("session ended");
                if let Some(menus) = self.menus.get() {
                    menus.main.stop();
                    menus.login.run();
                }
            }
            Ok(false) => self.failure(LOGOUT_FAILED),
            Err(e) => self.report_request_error(&e),
        }
    }
}
