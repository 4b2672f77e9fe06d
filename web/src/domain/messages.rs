//! User-facing copy.
//!
//! The product ships in Vietnamese; every string a person can read on screen
//! is collected here so handlers and validators never inline copy.

/// Generic failure when the backend cannot be reached or answers garbage.
pub const BACKEND_UNREACHABLE: &str = "Không thể kết nối tới máy chủ. Vui lòng thử lại sau.";
/// Form rejected before reaching the backend.
pub const FORM_INVALID: &str = "Dữ liệu không hợp lệ.";
/// Authenticated call attempted without a session.
pub const NO_SESSION_TOKEN: &str = "no session token";
/// Default message for rejected credentials.
pub const INVALID_CREDENTIALS: &str = "Email hoặc mật khẩu không đúng";
/// Default message for any other login failure.
pub const LOGIN_FAILED: &str = "Đăng nhập thất bại. Vui lòng thử lại.";
/// Default message for a failed registration.
pub const REGISTER_FAILED: &str = "Đăng ký thất bại.";
/// Default message for a successful registration.
pub const REGISTER_SUCCEEDED: &str = "Đăng ký thành công! Vui lòng nhập mã OTP đã gửi tới email.";
/// Default message for a failed profile lookup.
pub const PROFILE_FAILED: &str = "Không thể tải trang cá nhân.";
/// Default message for a successful OTP verification.
pub const VERIFY_SUCCEEDED: &str = "Xác thực tài khoản thành công! Vui lòng đăng nhập lại.";
/// Default message for a failed OTP verification.
pub const VERIFY_FAILED: &str = "Xác thực OTP thất bại.";
/// Default message for a successful OTP resend.
pub const RESEND_SUCCEEDED: &str = "Đã gửi lại OTP!";
/// Default message for a failed OTP resend.
pub const RESEND_FAILED: &str = "Gửi lại OTP thất bại.";
/// Resend attempted while the cooldown is still running.
pub const RESEND_COOLING_DOWN: &str = "Vui lòng đợi trước khi gửi lại OTP.";
/// Page or action requires a session.
pub const LOGIN_REQUIRED: &str = "Vui lòng đăng nhập.";
/// Session refresh failed.
pub const REFRESH_FAILED: &str = "Không thể làm mới phiên đăng nhập.";

/// Field validation copy.
pub mod fields {
    /// Email left blank.
    pub const EMAIL_REQUIRED: &str = "Email không được để trống";
    /// Email not shaped like an address.
    pub const EMAIL_INVALID: &str = "Email không đúng định dạng email.";
    /// Password left blank.
    pub const PASSWORD_REQUIRED: &str = "Mật khẩu không được để trống";
    /// Password shorter than the registration minimum.
    pub const PASSWORD_TOO_SHORT: &str = "Mật khẩu phải có ít nhất 6 ký tự.";
    /// Confirmation differs from the password.
    pub const CONFIRM_MISMATCH: &str = "Xác nhận mật khẩu không khớp.";
    /// OTP not exactly six digits.
    pub const OTP_INVALID: &str = "Mã OTP phải có đủ 6 chữ số.";
}
