fn main() {
    arcade_shooter::game::run();
}
